//! Named structural validators consulted before any write is persisted
//!
//! Validators operate on the parsed JSON value image of a document (TOML
//! documents are validated through the same image). A write that fails
//! validation is aborted with the original file untouched.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

/// Schema key for MCP server documents (`.mcp.json`, `~/.claude.json`)
pub const MCP_DOCUMENT: &str = "mcp-document";
/// Schema key for Claude settings documents
pub const CLAUDE_SETTINGS: &str = "claude-settings";
/// Schema key for the Codex `config.toml`
pub const CODEX_CONFIG: &str = "codex-config";
/// Schema key for the persisted profile store
pub const PROFILE_STORE: &str = "profile-store";
/// Schema key for exported profile bundles
pub const PROFILE_BUNDLE: &str = "profile-bundle";

/// A named structural validator
pub trait SchemaValidator: Send + Sync {
    /// The registry key for this validator
    fn key(&self) -> &'static str;

    /// Check the value's structure, returning a human-readable reason on
    /// failure
    fn validate(&self, value: &Value) -> Result<(), String>;
}

/// Registry of pluggable validators, looked up by key
pub struct SchemaRegistry {
    validators: HashMap<&'static str, Box<dyn SchemaValidator>>,
}

impl SchemaRegistry {
    /// An empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// Registry pre-loaded with all built-in validators
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(McpDocumentSchema));
        registry.register(Box::new(ClaudeSettingsSchema));
        registry.register(Box::new(CodexConfigSchema));
        registry.register(Box::new(ProfileStoreSchema));
        registry.register(Box::new(ProfileBundleSchema));
        registry
    }

    /// Register a validator, replacing any previous one with the same key
    pub fn register(&mut self, validator: Box<dyn SchemaValidator>) {
        self.validators.insert(validator.key(), validator);
    }

    /// Validate a value against the named schema
    pub fn validate(&self, key: &str, value: &Value) -> ConfigResult<()> {
        let validator = self
            .validators
            .get(key)
            .ok_or_else(|| ConfigError::Internal(format!("unknown schema key: {key}")))?;
        validator
            .validate(value)
            .map_err(|detail| ConfigError::ValidationFailed {
                schema: key.to_string(),
                detail,
            })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn require_object<'a>(value: &'a Value, what: &str) -> Result<&'a serde_json::Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{what} must be an object"))
}

fn check_server_entry(name: &str, server: &Value) -> Result<(), String> {
    let obj = require_object(server, &format!("server '{name}'"))?;
    let transport = obj.get("type").and_then(Value::as_str).unwrap_or("stdio");
    match transport {
        "stdio" => {
            if obj.get("command").and_then(Value::as_str).is_none() {
                return Err(format!("server '{name}': stdio transport requires 'command'"));
            }
        }
        "http" | "sse" => {
            if obj.get("url").and_then(Value::as_str).is_none() {
                return Err(format!("server '{name}': {transport} transport requires 'url'"));
            }
        }
        other => return Err(format!("server '{name}': unknown transport '{other}'")),
    }
    if let Some(args) = obj.get("args") {
        if !args.is_array() {
            return Err(format!("server '{name}': 'args' must be an array"));
        }
    }
    if let Some(env) = obj.get("env") {
        if !env.is_object() {
            return Err(format!("server '{name}': 'env' must be an object"));
        }
    }
    Ok(())
}

/// MCP document: root object, servers either flat or under `mcpServers`
struct McpDocumentSchema;

impl SchemaValidator for McpDocumentSchema {
    fn key(&self) -> &'static str {
        MCP_DOCUMENT
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        let root = require_object(value, "document root")?;
        if let Some(servers) = root.get("mcpServers") {
            let servers = require_object(servers, "'mcpServers'")?;
            for (name, server) in servers {
                check_server_entry(name, server)?;
            }
        }
        Ok(())
    }
}

/// Claude settings document: hooks map of arrays, disabled-server list of
/// strings; every other field is passed through untouched
struct ClaudeSettingsSchema;

impl SchemaValidator for ClaudeSettingsSchema {
    fn key(&self) -> &'static str {
        CLAUDE_SETTINGS
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        let root = require_object(value, "document root")?;
        if let Some(hooks) = root.get("hooks") {
            let hooks = require_object(hooks, "'hooks'")?;
            for (event, entries) in hooks {
                let entries = entries
                    .as_array()
                    .ok_or_else(|| format!("hooks.{event} must be an array"))?;
                for entry in entries {
                    require_object(entry, &format!("hooks.{event} entry"))?;
                }
            }
        }
        if let Some(disabled) = root.get("disabledMcpjsonServers") {
            let list = disabled
                .as_array()
                .ok_or("'disabledMcpjsonServers' must be an array")?;
            if !list.iter().all(Value::is_string) {
                return Err("'disabledMcpjsonServers' entries must be strings".into());
            }
        }
        Ok(())
    }
}

/// Codex config: root table, `mcp_servers` table of tables with a command
struct CodexConfigSchema;

impl SchemaValidator for CodexConfigSchema {
    fn key(&self) -> &'static str {
        CODEX_CONFIG
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        let root = require_object(value, "document root")?;
        if let Some(servers) = root.get("mcp_servers") {
            let servers = require_object(servers, "'mcp_servers'")?;
            for (name, server) in servers {
                let obj = require_object(server, &format!("mcp_servers.{name}"))?;
                if obj.get("command").and_then(Value::as_str).is_none() {
                    return Err(format!("mcp_servers.{name}: 'command' is required"));
                }
                if let Some(enabled) = obj.get("enabled") {
                    if !enabled.is_boolean() {
                        return Err(format!("mcp_servers.{name}: 'enabled' must be a boolean"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Persisted profile store: profiles array + nullable active pointer
struct ProfileStoreSchema;

impl SchemaValidator for ProfileStoreSchema {
    fn key(&self) -> &'static str {
        PROFILE_STORE
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        let root = require_object(value, "store root")?;
        let profiles = root
            .get("profiles")
            .and_then(Value::as_array)
            .ok_or("'profiles' must be an array")?;
        for profile in profiles {
            let obj = require_object(profile, "profile")?;
            if obj.get("id").and_then(Value::as_str).is_none() {
                return Err("profile 'id' must be a string".into());
            }
            if obj.get("name").and_then(Value::as_str).is_none() {
                return Err("profile 'name' must be a string".into());
            }
            let tools = obj
                .get("tools")
                .and_then(Value::as_array)
                .ok_or("profile 'tools' must be an array")?;
            for entry in tools {
                let entry = require_object(entry, "profile tool entry")?;
                if entry.get("key").and_then(Value::as_str).is_none() {
                    return Err("tool entry 'key' must be a string".into());
                }
                if entry.get("enabled").and_then(Value::as_bool).is_none() {
                    return Err("tool entry 'enabled' must be a boolean".into());
                }
            }
        }
        if let Some(active) = root.get("active_profile_id") {
            if !active.is_null() && !active.is_string() {
                return Err("'active_profile_id' must be a string or null".into());
            }
        }
        Ok(())
    }
}

/// Exported profile bundle: discriminator + version + embedded tools
struct ProfileBundleSchema;

impl SchemaValidator for ProfileBundleSchema {
    fn key(&self) -> &'static str {
        PROFILE_BUNDLE
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        let root = require_object(value, "bundle root")?;
        match root.get("bundle_type").and_then(Value::as_str) {
            Some("loadout-profile") => {}
            Some(other) => return Err(format!("unknown bundle_type '{other}'")),
            None => return Err("'bundle_type' is required".into()),
        }
        if root.get("version").and_then(Value::as_u64).is_none() {
            return Err("'version' must be a number".into());
        }
        let tools = root
            .get("tools")
            .and_then(Value::as_array)
            .ok_or("'tools' must be an array")?;
        for tool in tools {
            let obj = require_object(tool, "bundle tool")?;
            match obj.get("kind").and_then(Value::as_str) {
                Some("mcp_server" | "skill" | "command" | "hook") => {}
                Some(other) => return Err(format!("unknown tool kind '{other}'")),
                None => return Err("bundle tool 'kind' is required".into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mcp_document_valid() {
        let registry = SchemaRegistry::builtin();
        let doc = json!({
            "mcpServers": {
                "context7": {"type": "stdio", "command": "npx", "args": ["-y"]}
            },
            "someUnknownField": 42
        });
        assert!(registry.validate(MCP_DOCUMENT, &doc).is_ok());
    }

    #[test]
    fn test_mcp_document_missing_command() {
        let registry = SchemaRegistry::builtin();
        let doc = json!({"mcpServers": {"bad": {"type": "stdio"}}});
        let err = registry.validate(MCP_DOCUMENT, &doc).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_mcp_document_http_requires_url() {
        let registry = SchemaRegistry::builtin();
        let doc = json!({"mcpServers": {"bad": {"type": "http"}}});
        assert!(registry.validate(MCP_DOCUMENT, &doc).is_err());
        let doc = json!({"mcpServers": {"ok": {"type": "http", "url": "https://x"}}});
        assert!(registry.validate(MCP_DOCUMENT, &doc).is_ok());
    }

    #[test]
    fn test_claude_settings_disabled_list() {
        let registry = SchemaRegistry::builtin();
        let doc = json!({"disabledMcpjsonServers": ["a", "b"]});
        assert!(registry.validate(CLAUDE_SETTINGS, &doc).is_ok());
        let doc = json!({"disabledMcpjsonServers": [1]});
        assert!(registry.validate(CLAUDE_SETTINGS, &doc).is_err());
    }

    #[test]
    fn test_codex_config_enabled_flag() {
        let registry = SchemaRegistry::builtin();
        let doc = json!({"mcp_servers": {"foo": {"command": "uvx", "enabled": false}}});
        assert!(registry.validate(CODEX_CONFIG, &doc).is_ok());
        let doc = json!({"mcp_servers": {"foo": {"command": "uvx", "enabled": "no"}}});
        assert!(registry.validate(CODEX_CONFIG, &doc).is_err());
    }

    #[test]
    fn test_profile_store_schema() {
        let registry = SchemaRegistry::builtin();
        let doc = json!({
            "profiles": [
                {"id": "x", "name": "dev", "tools": [{"key": "mcp:user:a", "enabled": true}]}
            ],
            "active_profile_id": null
        });
        assert!(registry.validate(PROFILE_STORE, &doc).is_ok());

        let doc = json!({"profiles": [{"id": "x", "tools": []}]});
        assert!(registry.validate(PROFILE_STORE, &doc).is_err());
    }

    #[test]
    fn test_bundle_schema() {
        let registry = SchemaRegistry::builtin();
        let doc = json!({
            "bundle_type": "loadout-profile",
            "version": 1,
            "profile": {"name": "dev"},
            "tools": [{"kind": "mcp_server", "key": "mcp:user:a", "enabled": true, "config": {}}]
        });
        assert!(registry.validate(PROFILE_BUNDLE, &doc).is_ok());

        let doc = json!({"bundle_type": "other", "version": 1, "tools": []});
        assert!(registry.validate(PROFILE_BUNDLE, &doc).is_err());
    }

    #[test]
    fn test_unknown_schema_key() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.validate("nonexistent", &json!({})).is_err());
    }
}
