//! Tool manager
//!
//! Translates one canonical tool into adapter calls and folds the outcome
//! into an `ActionResult`. This is the synchronization point the profile
//! engine drives one toggle at a time.

use tracing::info;

use crate::adapter::{PlatformAdapter, ToggleOutcome};
use crate::config::ConfigService;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{NormalizedTool, ToolKind};

/// Outcome of a single tool action
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub success: bool,
    /// Human-readable error when `success` is false
    pub error: Option<String>,
}

impl ActionResult {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: &ConfigError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Drives tool actions against the active platform
pub struct ToolManager<'a> {
    service: &'a ConfigService,
    adapter: &'a dyn PlatformAdapter,
}

impl<'a> ToolManager<'a> {
    pub fn new(service: &'a ConfigService, adapter: &'a dyn PlatformAdapter) -> Self {
        Self { service, adapter }
    }

    /// The adapter this manager drives
    #[must_use]
    pub fn adapter(&self) -> &dyn PlatformAdapter {
        self.adapter
    }

    /// All tools of one kind across every scope
    #[must_use]
    pub fn list_tools(&self, kind: ToolKind) -> Vec<NormalizedTool> {
        self.service.read_all_tools(self.adapter, kind)
    }

    /// The complete inventory, every kind and scope
    #[must_use]
    pub fn inventory(&self) -> Vec<NormalizedTool> {
        self.service.read_inventory(self.adapter)
    }

    /// Drive a tool to the requested enabled state
    pub fn toggle_tool(&self, tool: &NormalizedTool, enable: bool) -> ActionResult {
        match self.try_toggle(tool, enable) {
            Ok(outcome) => {
                info!(
                    name = %tool.name,
                    kind = %tool.kind,
                    scope = %tool.scope,
                    enable,
                    changed = matches!(outcome, ToggleOutcome::Changed),
                    "toggled tool"
                );
                ActionResult::ok()
            }
            Err(e) => ActionResult::failed(&e),
        }
    }

    /// Remove a tool from its scope
    pub fn delete_tool(&self, tool: &NormalizedTool) -> ActionResult {
        match self.try_delete(tool) {
            Ok(()) => {
                info!(name = %tool.name, kind = %tool.kind, scope = %tool.scope, "deleted tool");
                ActionResult::ok()
            }
            Err(e) => ActionResult::failed(&e),
        }
    }

    fn try_toggle(&self, tool: &NormalizedTool, enable: bool) -> ConfigResult<ToggleOutcome> {
        if !tool.scope.is_writable() {
            return Err(ConfigError::ManagedScope);
        }
        self.adapter.toggle_tool(self.service, tool, enable)
    }

    fn try_delete(&self, tool: &NormalizedTool) -> ConfigResult<()> {
        if !tool.scope.is_writable() {
            return Err(ConfigError::ManagedScope);
        }
        self.adapter.remove_tool(self.service, tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterEnv, ClaudeAdapter};
    use crate::model::{ToolMetadata, ToolScope, ToolSource, ToolStatus};

    fn managed_tool() -> NormalizedTool {
        NormalizedTool {
            id: "hook:managed:SessionStart:*:0".into(),
            kind: ToolKind::Hook,
            scope: ToolScope::Managed,
            status: ToolStatus::Enabled,
            status_detail: None,
            name: "SessionStart:*".into(),
            description: None,
            source: ToolSource::file("managed-settings.json"),
            metadata: ToolMetadata::default_for(ToolKind::Hook),
        }
    }

    #[test]
    fn test_managed_scope_refused() {
        let dir = tempfile::tempdir().unwrap();
        let env = AdapterEnv::new(dir.path().to_path_buf());
        let adapter = ClaudeAdapter::new(env);
        let service = ConfigService::new(dir.path().join("backups"));
        let manager = ToolManager::new(&service, &adapter);

        let result = manager.toggle_tool(&managed_tool(), false);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("managed scope"));

        let result = manager.delete_tool(&managed_tool());
        assert!(!result.success);
    }
}
