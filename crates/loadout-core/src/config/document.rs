//! Format-aware config documents
//!
//! A `ConfigDocument` holds one parsed config file as a generic JSON value
//! tree, regardless of whether the file is encoded as JSON or TOML.
//! Mutations operate on the value tree, so fields the engine does not
//! understand survive a read-modify-write cycle untouched. TOML files keep
//! their original text alongside the tree; serializing applies the tree
//! back onto it as an edit, so comments and key order survive too.

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use toml_edit::{DocumentMut, Item};

use crate::error::{ConfigError, ConfigResult};

/// Field name the `toml` crate uses for datetimes in its serde bridge
const TOML_DATETIME_FIELD: &str = "$__toml_private_datetime";

/// On-disk encoding of a config document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension, defaulting to JSON
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// A parsed config file plus its encoding
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub format: DocumentFormat,
    pub value: Value,
    /// Original file text, kept for TOML so edits preserve formatting
    raw: Option<String>,
}

impl ConfigDocument {
    /// An empty document (JSON object root) in the given format
    #[must_use]
    pub fn empty(format: DocumentFormat) -> Self {
        Self {
            format,
            value: Value::Object(serde_json::Map::new()),
            raw: None,
        }
    }

    /// Parse raw file content in the format implied by the path
    pub fn parse(path: &Path, content: &str) -> ConfigResult<Self> {
        let format = DocumentFormat::from_path(path);
        let (value, raw) = match format {
            DocumentFormat::Json => {
                let value =
                    serde_json::from_str(content).map_err(|e| ConfigError::JsonParse {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                (value, None)
            }
            DocumentFormat::Toml => {
                let table: toml::Value =
                    toml::from_str(content).map_err(|e| ConfigError::TomlParse {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                let value = serde_json::to_value(table)
                    .map_err(|e| ConfigError::Internal(e.to_string()))?;
                (value, Some(content.to_string()))
            }
        };
        Ok(Self { format, value, raw })
    }

    /// Serialize back to the on-disk encoding
    ///
    /// JSON is re-rendered from the value tree. TOML is produced by
    /// editing the original text in place: unchanged keys keep their
    /// comments, ordering, and inline style.
    pub fn serialize(&self) -> ConfigResult<String> {
        match self.format {
            DocumentFormat::Json => {
                let mut out = serde_json::to_string_pretty(&self.value)
                    .map_err(|e| ConfigError::Internal(e.to_string()))?;
                out.push('\n');
                Ok(out)
            }
            DocumentFormat::Toml => {
                let mut doc = match &self.raw {
                    Some(raw) => raw
                        .parse::<DocumentMut>()
                        .map_err(|e| ConfigError::Internal(e.to_string()))?,
                    None => DocumentMut::new(),
                };
                let Some(map) = self.value.as_object() else {
                    return Err(ConfigError::Internal(
                        "TOML document root must be a table".into(),
                    ));
                };
                sync_table(doc.as_table_mut(), map)?;
                Ok(doc.to_string())
            }
        }
    }
}

/// Apply a JSON object onto a TOML table, touching only keys that differ
fn sync_table(
    table: &mut toml_edit::Table,
    map: &serde_json::Map<String, Value>,
) -> ConfigResult<()> {
    let stale: Vec<String> = table
        .iter()
        .map(|(k, _)| k.to_string())
        .filter(|k| !map.contains_key(k))
        .collect();
    for key in stale {
        table.remove(&key);
    }

    for (key, value) in map {
        if let (Some(Item::Table(sub)), Some(obj)) = (table.get_mut(key), plain_object(value)) {
            sync_table(sub, obj)?;
            continue;
        }
        match table.get_mut(key) {
            Some(item) => {
                if item_to_json(item).as_ref() != Some(value) {
                    *item = json_to_item(value, item.is_value())?;
                }
            }
            None => {
                let item = json_to_item(value, false)?;
                table.insert(key, item);
            }
        }
    }
    Ok(())
}

/// The object's map, unless it is the datetime marker shape
fn plain_object(value: &Value) -> Option<&serde_json::Map<String, Value>> {
    let map = value.as_object()?;
    if map.len() == 1 && map.contains_key(TOML_DATETIME_FIELD) {
        return None;
    }
    Some(map)
}

/// Build a TOML item for a JSON value
///
/// Objects become standard tables, or inline tables when replacing an
/// existing inline value so the file keeps its style.
fn json_to_item(value: &Value, inline: bool) -> ConfigResult<Item> {
    if let Some(map) = plain_object(value) {
        if inline {
            return Ok(Item::Value(json_to_toml_value(value)?));
        }
        let mut table = toml_edit::Table::new();
        for (k, v) in map {
            table.insert(k, json_to_item(v, false)?);
        }
        if !table.is_empty() && table.iter().all(|(_, item)| matches!(item, Item::Table(_))) {
            table.set_implicit(true);
        }
        return Ok(Item::Table(table));
    }
    Ok(Item::Value(json_to_toml_value(value)?))
}

/// Convert a JSON value to a TOML value (objects become inline tables)
///
/// Nulls have no TOML representation and are rejected rather than silently
/// dropped.
fn json_to_toml_value(value: &Value) -> ConfigResult<toml_edit::Value> {
    match value {
        Value::Null => Err(ConfigError::Internal(
            "null has no TOML representation".into(),
        )),
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into())
            } else {
                Ok(n.as_f64().unwrap_or(0.0).into())
            }
        }
        Value::String(s) => Ok(s.as_str().into()),
        Value::Array(arr) => {
            let mut out = toml_edit::Array::new();
            for item in arr {
                out.push(json_to_toml_value(item)?);
            }
            Ok(toml_edit::Value::Array(out))
        }
        Value::Object(map) => {
            if let Some(dt) = map.get(TOML_DATETIME_FIELD).and_then(Value::as_str) {
                if map.len() == 1 {
                    let parsed = dt.parse::<toml_edit::Datetime>().map_err(|e| {
                        ConfigError::Internal(format!("invalid TOML datetime '{dt}': {e}"))
                    })?;
                    return Ok(toml_edit::Value::Datetime(toml_edit::Formatted::new(
                        parsed,
                    )));
                }
            }
            let mut out = toml_edit::InlineTable::new();
            for (k, v) in map {
                out.insert(k.as_str(), json_to_toml_value(v)?);
            }
            Ok(toml_edit::Value::InlineTable(out))
        }
    }
}

/// The JSON image of a TOML item, for change detection
///
/// Mirrors the `toml` crate's serde bridge so a value parsed into the tree
/// compares equal to its unedited original.
fn item_to_json(item: &Item) -> Option<Value> {
    match item {
        Item::None => None,
        Item::Value(value) => toml_value_to_json(value),
        Item::Table(table) => table_to_json(table),
        Item::ArrayOfTables(tables) => {
            let mut out = Vec::with_capacity(tables.len());
            for table in tables.iter() {
                out.push(table_to_json(table)?);
            }
            Some(Value::Array(out))
        }
    }
}

fn table_to_json(table: &toml_edit::Table) -> Option<Value> {
    let mut map = serde_json::Map::new();
    for (key, item) in table.iter() {
        map.insert(key.to_string(), item_to_json(item)?);
    }
    Some(Value::Object(map))
}

fn toml_value_to_json(value: &toml_edit::Value) -> Option<Value> {
    match value {
        toml_edit::Value::String(s) => Some(Value::String(s.value().clone())),
        toml_edit::Value::Integer(i) => Some(Value::from(*i.value())),
        toml_edit::Value::Float(f) => serde_json::Number::from_f64(*f.value()).map(Value::Number),
        toml_edit::Value::Boolean(b) => Some(Value::Bool(*b.value())),
        toml_edit::Value::Datetime(dt) => Some(serde_json::json!({
            TOML_DATETIME_FIELD: dt.value().to_string()
        })),
        toml_edit::Value::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                out.push(toml_value_to_json(item)?);
            }
            Some(Value::Array(out))
        }
        toml_edit::Value::InlineTable(table) => {
            let mut map = serde_json::Map::new();
            for (key, item) in table.iter() {
                map.insert(key.to_string(), toml_value_to_json(item)?);
            }
            Some(Value::Object(map))
        }
    }
}

/// Write content to a path crash-safely: stage to a temp file in the same
/// directory, then rename into place
pub fn write_atomic(path: &Path, content: &str) -> ConfigResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| ConfigError::Internal(format!("no parent directory for {path:?}")))?;
    fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, &e))?;

    let mut staged =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| ConfigError::io(parent, &e))?;
    staged
        .write_all(content.as_bytes())
        .map_err(|e| ConfigError::io(path, &e))?;
    staged
        .persist(path)
        .map_err(|e| ConfigError::io(path, &e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("config.toml")),
            DocumentFormat::Toml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new(".mcp.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("settings")),
            DocumentFormat::Json
        );
    }

    #[test]
    fn test_json_round_trip() {
        let path = PathBuf::from("settings.json");
        let doc = ConfigDocument::parse(&path, r#"{"a": 1, "nested": {"b": [true]}}"#).unwrap();
        let out = doc.serialize().unwrap();
        let reparsed = ConfigDocument::parse(&path, &out).unwrap();
        assert_eq!(doc.value, reparsed.value);
    }

    #[test]
    fn test_toml_round_trip() {
        let path = PathBuf::from("config.toml");
        let content = "model = \"gpt-5\"\n\n[mcp_servers.docs]\ncommand = \"uvx\"\nargs = [\"mcp-docs\"]\nenabled = false\n";
        let doc = ConfigDocument::parse(&path, content).unwrap();
        assert_eq!(doc.value["mcp_servers"]["docs"]["command"], "uvx");
        assert_eq!(doc.value["mcp_servers"]["docs"]["enabled"], false);

        let out = doc.serialize().unwrap();
        let reparsed = ConfigDocument::parse(&path, &out).unwrap();
        assert_eq!(doc.value, reparsed.value);
    }

    #[test]
    fn test_toml_unedited_keeps_exact_text() {
        let path = PathBuf::from("config.toml");
        let content = "# top comment\nmodel = \"gpt-5\"  # trailing\n\n[mcp_servers.docs]\ncommand = \"uvx\"\n";
        let doc = ConfigDocument::parse(&path, content).unwrap();
        assert_eq!(doc.serialize().unwrap(), content);
    }

    #[test]
    fn test_toml_edit_preserves_comments_and_order() {
        let path = PathBuf::from("config.toml");
        let content = "# user config\nmodel = \"gpt-5\"\n\n[mcp_servers.docs]\ncommand = \"uvx\" # fast runner\n";
        let mut doc = ConfigDocument::parse(&path, content).unwrap();
        doc.value["mcp_servers"]["docs"]["enabled"] = json!(false);

        let out = doc.serialize().unwrap();
        assert!(out.contains("# user config"));
        assert!(out.contains("command = \"uvx\" # fast runner"));
        assert!(out.contains("enabled = false"));
        assert!(out.starts_with("# user config\nmodel = \"gpt-5\""));
    }

    #[test]
    fn test_toml_key_removal_keeps_surroundings() {
        let path = PathBuf::from("config.toml");
        let content = "# keep me\nmodel = \"gpt-5\"\n\n[mcp_servers.docs]\ncommand = \"uvx\"\nenabled = false\n";
        let mut doc = ConfigDocument::parse(&path, content).unwrap();
        doc.value["mcp_servers"]["docs"]
            .as_object_mut()
            .unwrap()
            .remove("enabled");

        let out = doc.serialize().unwrap();
        assert!(out.contains("# keep me"));
        assert!(!out.contains("enabled"));
        assert!(out.contains("command = \"uvx\""));
    }

    #[test]
    fn test_toml_new_table_from_scratch() {
        let mut doc = ConfigDocument::empty(DocumentFormat::Toml);
        doc.value["mcp_servers"]["docs"] = json!({"command": "uvx", "args": ["mcp-docs"]});

        let out = doc.serialize().unwrap();
        let reparsed = ConfigDocument::parse(&PathBuf::from("config.toml"), &out).unwrap();
        assert_eq!(reparsed.value["mcp_servers"]["docs"]["command"], "uvx");
    }

    #[test]
    fn test_toml_rejects_null() {
        let mut doc = ConfigDocument::empty(DocumentFormat::Toml);
        doc.value["bad"] = Value::Null;
        assert!(doc.serialize().is_err());
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/file.json");
        write_atomic(&path, "{}\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
