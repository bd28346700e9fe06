//! YAML frontmatter parsing for skills and commands

use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// A parsed skill manifest (SKILL.md)
///
/// Only the frontmatter is interpreted; callers keep the full file
/// content themselves when they need it verbatim.
#[derive(Debug, Clone)]
pub struct SkillManifest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub allowed_tools: Vec<String>,
    pub model: Option<String>,
    /// Frontmatter fields the engine does not interpret
    pub extra: Map<String, Value>,
}

/// A parsed command file
#[derive(Debug, Clone)]
pub struct CommandFile {
    pub description: Option<String>,
    pub argument_hint: Option<String>,
    pub model: Option<String>,
    pub extra: Map<String, Value>,
}

/// Parse a SKILL.md manifest
///
/// # Errors
/// Returns an error if the file has no frontmatter or the YAML is invalid.
pub fn parse_skill_manifest(path: &Path, content: &str) -> ConfigResult<SkillManifest> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let data = result
        .data
        .ok_or_else(|| ConfigError::Frontmatter {
            path: path.to_path_buf(),
            message: "missing frontmatter".into(),
        })?
        .deserialize::<Value>()
        .map_err(|e| ConfigError::Frontmatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut fields = data.as_object().cloned().unwrap_or_default();

    let name = take_string(&mut fields, "name");
    let description = take_string(&mut fields, "description");
    let model = take_string(&mut fields, "model");
    let allowed_tools = take_string_list(&mut fields, "allowed-tools");

    Ok(SkillManifest {
        name,
        description,
        allowed_tools,
        model,
        extra: fields,
    })
}

/// Parse a command markdown file
///
/// Frontmatter is optional for commands; a file with none is a bare body.
///
/// # Errors
/// Returns an error if present frontmatter is invalid YAML.
pub fn parse_command_file(path: &Path, content: &str) -> ConfigResult<CommandFile> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let mut fields = match result.data {
        Some(data) => data
            .deserialize::<Value>()
            .map_err(|e| ConfigError::Frontmatter {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .as_object()
            .cloned()
            .unwrap_or_default(),
        None => Map::new(),
    };

    let description = take_string(&mut fields, "description");
    let argument_hint = take_string(&mut fields, "argument-hint");
    let model = take_string(&mut fields, "model");

    Ok(CommandFile {
        description,
        argument_hint,
        model,
        extra: fields,
    })
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            // Keep non-string values in extra rather than losing them
            fields.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn take_string_list(fields: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match fields.remove(key) {
        Some(Value::Array(arr)) => arr
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(other) => {
            fields.insert(key.to_string(), other);
            Vec::new()
        }
        None => Vec::new(),
    }
}
