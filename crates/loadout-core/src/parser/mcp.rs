//! MCP server document transforms
//!
//! MCP documents come in two shapes: a flat object of servers, or servers
//! nested under an `mcpServers` wrapper. Reads accept both; writes always
//! target the wrapper, matching how the host platforms persist it.

use serde_json::{Map, Value};

/// Extract `(name, config)` pairs from an MCP document value
///
/// Entries under an `mcpServers` wrapper and flat root-level entries are
/// both accepted; non-object values are skipped.
#[must_use]
pub fn server_entries(document: &Value) -> Vec<(String, Value)> {
    let Some(root) = document.as_object() else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (name, value) in root {
        if name == "mcpServers" {
            if let Some(inner) = value.as_object() {
                for (inner_name, inner_value) in inner {
                    if inner_value.is_object() {
                        entries.push((inner_name.clone(), inner_value.clone()));
                    }
                }
            }
            continue;
        }
        if value.is_object() && looks_like_server(value) {
            entries.push((name.clone(), value.clone()));
        }
    }
    entries
}

/// Heuristic for flat-root documents: a server entry has a command or url
fn looks_like_server(value: &Value) -> bool {
    value.get("command").is_some() || value.get("url").is_some()
}

/// Insert or replace a server under the `mcpServers` wrapper
pub fn insert_server(document: &mut Value, name: &str, config: Value) {
    if !document.is_object() {
        *document = Value::Object(Map::new());
    }
    if let Some(root) = document.as_object_mut() {
        let servers = root
            .entry("mcpServers")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(servers) = servers.as_object_mut() {
            servers.insert(name.to_string(), config);
        }
    }
}

/// Remove a server by name from both the wrapper and the flat root
///
/// Returns true if an entry was removed.
pub fn remove_server(document: &mut Value, name: &str) -> bool {
    let Some(root) = document.as_object_mut() else {
        return false;
    };

    let mut removed = false;
    if let Some(servers) = root.get_mut("mcpServers").and_then(Value::as_object_mut) {
        removed |= servers.remove(name).is_some();
    }
    if root.get(name).is_some_and(looks_like_server) {
        removed |= root.remove(name).is_some();
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_from_wrapper() {
        let doc = json!({
            "mcpServers": {
                "a": {"command": "npx"},
                "b": {"url": "https://x"}
            }
        });
        let mut entries = server_entries(&doc);
        entries.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "a");
    }

    #[test]
    fn test_entries_from_flat_root() {
        let doc = json!({
            "a": {"command": "npx"},
            "notAServer": {"somethingElse": 1}
        });
        let entries = server_entries(&doc);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "a");
    }

    #[test]
    fn test_insert_targets_wrapper() {
        let mut doc = json!({});
        insert_server(&mut doc, "docs", json!({"command": "uvx"}));
        assert_eq!(doc["mcpServers"]["docs"]["command"], "uvx");
    }

    #[test]
    fn test_remove_from_either_shape() {
        let mut doc = json!({
            "flat": {"command": "a"},
            "mcpServers": {"wrapped": {"command": "b"}}
        });
        assert!(remove_server(&mut doc, "flat"));
        assert!(remove_server(&mut doc, "wrapped"));
        assert!(!remove_server(&mut doc, "absent"));
        assert_eq!(server_entries(&doc).len(), 0);
    }
}
