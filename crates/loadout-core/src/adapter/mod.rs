//! Platform adapters
//!
//! One concrete type per agent platform. Each adapter knows its
//! platform's file paths, formats, and enable/disable encoding, and
//! exposes the uniform read/write/toggle/detect contract. No code outside
//! this module branches on platform identity.

pub mod claude;
pub mod codex;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::ConfigService;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{NormalizedTool, ToolKind, ToolScope};
use crate::watch::WatchPath;

pub use claude::ClaudeAdapter;
pub use codex::CodexAdapter;

/// Identity of a supported platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformId {
    Claude,
    Codex,
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claude => write!(f, "claude"),
            Self::Codex => write!(f, "codex"),
        }
    }
}

impl FromStr for PlatformId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "codex" => Ok(Self::Codex),
            _ => Err(ConfigError::InvalidName(format!("unknown platform: {s}"))),
        }
    }
}

/// Filesystem roots an adapter resolves its paths against
///
/// The home and managed roots are overridable so tests can run against a
/// sandbox.
#[derive(Debug, Clone)]
pub struct AdapterEnv {
    pub home: PathBuf,
    pub project_root: Option<PathBuf>,
    pub managed_root: PathBuf,
}

impl AdapterEnv {
    /// Environment rooted at an explicit home directory
    #[must_use]
    pub fn new(home: PathBuf) -> Self {
        Self {
            home,
            project_root: None,
            managed_root: default_managed_root(),
        }
    }

    /// Environment discovered from the running system
    pub fn discover() -> ConfigResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Internal("cannot find home directory".into()))?;
        Ok(Self::new(home))
    }

    /// Set the open workspace root
    #[must_use]
    pub fn with_project_root(mut self, root: PathBuf) -> Self {
        self.project_root = Some(root);
        self
    }

    /// Override the managed-scope root (tests)
    #[must_use]
    pub fn with_managed_root(mut self, root: PathBuf) -> Self {
        self.managed_root = root;
        self
    }
}

fn default_managed_root() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Application Support/ClaudeCode")
    }
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(r"C:\ProgramData\ClaudeCode")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        PathBuf::from("/etc/claude")
    }
}

/// Result of a toggle attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The encoding was rewritten to the requested state
    Changed,
    /// The tool was already in the requested state; no file was written
    AlreadyInState,
}

/// The capability contract every platform implements
///
/// Adapters receive the config service per call rather than owning it, so
/// construction stays acyclic: adapters are built from a plain
/// [`AdapterEnv`] and never hold write capability themselves.
pub trait PlatformAdapter {
    /// Platform identity
    fn id(&self) -> PlatformId;

    /// Human-readable platform name
    fn display_name(&self) -> &'static str;

    /// Cheap existence check used for platform auto-selection
    fn detect(&self) -> bool;

    /// Read all tools of one kind in one scope
    ///
    /// Returns `Ok(vec![])` for kind/scope combinations the platform does
    /// not support, and for scopes that need a workspace root when none
    /// is open. Malformed sources become `ToolStatus::Error` entries.
    fn read_tools(
        &self,
        service: &ConfigService,
        kind: ToolKind,
        scope: ToolScope,
    ) -> ConfigResult<Vec<NormalizedTool>>;

    /// Create or replace a tool in a scope
    fn write_tool(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        scope: ToolScope,
    ) -> ConfigResult<()>;

    /// Remove a tool from its scope
    fn remove_tool(&self, service: &ConfigService, tool: &NormalizedTool) -> ConfigResult<()>;

    /// Drive a tool to the requested enabled state
    ///
    /// The current status is recomputed from disk first; a tool already in
    /// the requested state is a no-op, not an error, and no file is
    /// written. The encoding applied is exactly the one the source
    /// currently uses.
    fn toggle_tool(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        enable: bool,
    ) -> ConfigResult<ToggleOutcome>;

    /// Paths a file watcher must observe for this scope
    fn watch_paths(&self, scope: ToolScope) -> Vec<WatchPath>;

    /// The MCP config file for a scope
    fn mcp_file_path(&self, scope: ToolScope) -> ConfigResult<PathBuf>;

    /// The schema key validating the MCP config file for a scope
    fn mcp_schema_key(&self, scope: ToolScope) -> ConfigResult<&'static str>;

    /// The skills directory for a scope
    fn skills_dir(&self, scope: ToolScope) -> ConfigResult<PathBuf>;

    /// The commands directory for a scope
    fn commands_dir(&self, scope: ToolScope) -> ConfigResult<PathBuf>;

    /// The settings file for a scope
    fn settings_path(&self, scope: ToolScope) -> ConfigResult<PathBuf>;
}

/// Owns all known adapters and picks the active one
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    /// Registry with every built-in platform
    #[must_use]
    pub fn with_defaults(env: &AdapterEnv) -> Self {
        Self {
            adapters: vec![
                Box::new(ClaudeAdapter::new(env.clone())),
                Box::new(CodexAdapter::new(env.clone())),
            ],
        }
    }

    /// All registered adapters
    pub fn adapters(&self) -> impl Iterator<Item = &dyn PlatformAdapter> {
        self.adapters.iter().map(AsRef::as_ref)
    }

    /// Look up an adapter by id
    pub fn get(&self, id: PlatformId) -> Option<&dyn PlatformAdapter> {
        self.adapters().find(|a| a.id() == id)
    }

    /// Auto-select the active platform
    ///
    /// Succeeds only when exactly one adapter detects positively; zero or
    /// several detections require the caller to disambiguate.
    pub fn detect_active(&self) -> ConfigResult<&dyn PlatformAdapter> {
        let detected: Vec<&dyn PlatformAdapter> =
            self.adapters().filter(|a| a.detect()).collect();
        match detected.len() {
            0 => Err(ConfigError::NoPlatform),
            1 => Ok(detected[0]),
            _ => Err(ConfigError::AmbiguousPlatform(
                detected.iter().map(|a| a.id().to_string()).collect(),
            )),
        }
    }
}

/// Helper for adapters: the scope-not-supported error for an operation
pub(crate) fn scope_not_supported(
    platform: &str,
    scope: ToolScope,
    operation: &'static str,
) -> ConfigError {
    ConfigError::ScopeNotSupported {
        platform: platform.to_string(),
        scope,
        operation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_id_round_trip() {
        assert_eq!(PlatformId::from_str("claude").unwrap(), PlatformId::Claude);
        assert_eq!(PlatformId::from_str("Codex").unwrap(), PlatformId::Codex);
        assert!(PlatformId::from_str("cursor").is_err());
    }

    #[test]
    fn test_detect_zero_platforms() {
        let dir = tempfile::tempdir().unwrap();
        let env = AdapterEnv::new(dir.path().to_path_buf());
        let registry = AdapterRegistry::with_defaults(&env);
        assert!(matches!(
            registry.detect_active(),
            Err(ConfigError::NoPlatform)
        ));
    }

    #[test]
    fn test_detect_single_platform() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();

        let env = AdapterEnv::new(dir.path().to_path_buf());
        let registry = AdapterRegistry::with_defaults(&env);
        let adapter = registry.detect_active().unwrap();
        assert_eq!(adapter.id(), PlatformId::Claude);
    }

    #[test]
    fn test_detect_ambiguous_platforms() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        std::fs::create_dir_all(dir.path().join(".codex")).unwrap();

        let env = AdapterEnv::new(dir.path().to_path_buf());
        let registry = AdapterRegistry::with_defaults(&env);
        assert!(matches!(
            registry.detect_active(),
            Err(ConfigError::AmbiguousPlatform(_))
        ));
    }
}
