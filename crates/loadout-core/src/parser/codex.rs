//! Codex `config.toml` transforms
//!
//! Servers live in `[mcp_servers.<name>]` tables. The disable encoding is
//! an inverted boolean flag stored alongside the other fields:
//! `enabled = false` disables, absence (or `true`) means enabled.

use serde_json::{Map, Value};

/// Extract `(name, config)` pairs from the `mcp_servers` tables
#[must_use]
pub fn server_entries(document: &Value) -> Vec<(String, Value)> {
    document
        .get("mcp_servers")
        .and_then(Value::as_object)
        .map(|servers| {
            servers
                .iter()
                .filter(|(_, v)| v.is_object())
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Whether a server entry is enabled under the inverted-flag encoding
#[must_use]
pub fn is_enabled(config: &Value) -> bool {
    config
        .get("enabled")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// Set a server's enabled state in place
///
/// Disabling writes `enabled = false`; enabling removes the flag so the
/// default applies. Returns false if the server is absent.
pub fn set_enabled(document: &mut Value, name: &str, enabled: bool) -> bool {
    let Some(server) = document
        .get_mut("mcp_servers")
        .and_then(Value::as_object_mut)
        .and_then(|servers| servers.get_mut(name))
        .and_then(Value::as_object_mut)
    else {
        return false;
    };

    if enabled {
        server.remove("enabled");
    } else {
        server.insert("enabled".into(), Value::Bool(false));
    }
    true
}

/// Insert or replace a server table
pub fn insert_server(document: &mut Value, name: &str, config: Value) {
    if !document.is_object() {
        *document = Value::Object(Map::new());
    }
    if let Some(root) = document.as_object_mut() {
        let servers = root
            .entry("mcp_servers")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(servers) = servers.as_object_mut() {
            servers.insert(name.to_string(), config);
        }
    }
}

/// Remove a server table by name; returns true if one was removed
pub fn remove_server(document: &mut Value, name: &str) -> bool {
    document
        .get_mut("mcp_servers")
        .and_then(Value::as_object_mut)
        .is_some_and(|servers| servers.remove(name).is_some())
}
