//! The canonical tool entity

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::key::canonical_key;
use super::metadata::ToolMetadata;
use super::scope::ToolScope;

/// Kind of tool a platform exposes
///
/// Additional platform-specific kinds are added by extending this enum,
/// never by special-casing call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Skill,
    McpServer,
    Hook,
    Command,
}

impl ToolKind {
    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::McpServer => "MCP server",
            Self::Hook => "hook",
            Self::Command => "command",
        }
    }

    /// Stable identifier used in canonical keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::McpServer => "mcp",
            Self::Hook => "hook",
            Self::Command => "command",
        }
    }

    /// All kinds, in read order
    pub fn all() -> &'static [ToolKind] {
        &[Self::Skill, Self::McpServer, Self::Hook, Self::Command]
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tool health as observed during a read pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Enabled,
    Disabled,
    /// Tool exists but is structurally incomplete
    Warning,
    /// Source file failed to parse
    Error,
}

impl ToolStatus {
    /// Whether the tool is currently active
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Exactly where on disk a tool's truth lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSource {
    /// The file defining this tool
    pub file_path: PathBuf,
    /// Whether the tool is a directory (e.g. a skill folder)
    pub is_directory: bool,
    /// Directory containing the tool, when directory-shaped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_path: Option<PathBuf>,
}

impl ToolSource {
    /// A single-file source
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
            is_directory: false,
            directory_path: None,
        }
    }

    /// A directory-shaped source (manifest file + containing directory)
    pub fn directory(manifest: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            file_path: manifest.into(),
            is_directory: true,
            directory_path: Some(dir.into()),
        }
    }
}

/// The canonical tool entity produced by every platform adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTool {
    /// Globally unique within one read pass
    pub id: String,
    /// Kind of tool
    pub kind: ToolKind,
    /// Scope where the tool was found
    pub scope: ToolScope,
    /// Observed status
    pub status: ToolStatus,
    /// Human-readable reason for Warning/Error status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    /// Tool name
    pub name: String,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the tool lives on disk
    pub source: ToolSource,
    /// Platform-specific fields, preserved losslessly
    pub metadata: ToolMetadata,
}

impl NormalizedTool {
    /// Stable, format-independent identity for this tool
    ///
    /// Two tools with the same logical identity always produce the same
    /// key regardless of which file currently stores them or which
    /// disable-encoding the platform uses.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        canonical_key(self.kind, self.scope, &self.identity())
    }

    /// The identity component of the canonical key
    fn identity(&self) -> String {
        match &self.metadata {
            ToolMetadata::Hook {
                event,
                matcher,
                index,
                ..
            } => format!("{event}:{}:{index}", matcher.as_deref().unwrap_or("*")),
            _ => self.name.clone(),
        }
    }

    /// Display name combining kind and name
    pub fn display_name(&self) -> String {
        format!("{} '{}'", self.kind.display_name(), self.name)
    }
}
