//! Typed per-kind tool metadata
//!
//! Each variant models the fields the engine understands for that tool
//! kind, plus an `extra` map that carries every unrecognized field through
//! a read-modify-write cycle untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::tool::ToolKind;

/// MCP server transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    #[default]
    Stdio,
    Http,
    Sse,
}

impl McpTransport {
    /// Parse from the wire string, defaulting to stdio
    #[must_use]
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("http") => Self::Http,
            Some("sse") => Self::Sse,
            _ => Self::Stdio,
        }
    }
}

/// A single hook action definition, kept as raw JSON for lossless
/// round-tripping (platforms disagree on the exact shape)
pub type HookDefinition = Value;

/// Platform-specific fields keyed by tool kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolMetadata {
    McpServer {
        #[serde(default)]
        transport: McpTransport,
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        /// Unrecognized fields from the source document
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    Skill {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        allowed_tools: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        /// Verbatim manifest file content, used by export bundles
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Other files in the skill directory, keyed by relative path, so
        /// a bundle can recreate the whole directory elsewhere
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        files: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    Hook {
        /// Trigger event name (e.g. `PreToolUse`)
        event: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        matcher: Option<String>,
        /// Position within the event's matcher list; part of identity
        index: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        definitions: Vec<HookDefinition>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    Command {
        #[serde(skip_serializing_if = "Option::is_none")]
        argument_hint: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        /// Verbatim file content, used by export bundles
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
}

impl ToolMetadata {
    /// The tool kind this metadata belongs to
    #[must_use]
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::McpServer { .. } => ToolKind::McpServer,
            Self::Skill { .. } => ToolKind::Skill,
            Self::Hook { .. } => ToolKind::Hook,
            Self::Command { .. } => ToolKind::Command,
        }
    }

    /// An empty metadata value for the given kind
    #[must_use]
    pub fn default_for(kind: ToolKind) -> Self {
        match kind {
            ToolKind::McpServer => Self::McpServer {
                transport: McpTransport::Stdio,
                command: None,
                args: Vec::new(),
                env: BTreeMap::new(),
                url: None,
                extra: Map::new(),
            },
            ToolKind::Skill => Self::Skill {
                allowed_tools: Vec::new(),
                model: None,
                content: None,
                files: BTreeMap::new(),
                extra: Map::new(),
            },
            ToolKind::Hook => Self::Hook {
                event: String::new(),
                matcher: None,
                index: 0,
                definitions: Vec::new(),
                extra: Map::new(),
            },
            ToolKind::Command => Self::Command {
                argument_hint: None,
                model: None,
                content: None,
                extra: Map::new(),
            },
        }
    }

    /// Build MCP metadata from a raw server object, splitting known fields
    /// from unrecognized ones
    #[must_use]
    pub fn mcp_from_value(value: &Value) -> Self {
        let obj = value.as_object().cloned().unwrap_or_default();

        let transport = McpTransport::parse(obj.get("type").and_then(Value::as_str));
        let command = obj
            .get("command")
            .and_then(Value::as_str)
            .map(String::from);
        let args = obj
            .get("args")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        let env = obj
            .get("env")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        let url = obj.get("url").and_then(Value::as_str).map(String::from);

        let mut extra = Map::new();
        for (k, v) in obj {
            if !matches!(k.as_str(), "type" | "command" | "args" | "env" | "url") {
                extra.insert(k, v);
            }
        }

        Self::McpServer {
            transport,
            command,
            args,
            env,
            url,
            extra,
        }
    }

    /// Serialize MCP metadata back to the wire object, recombining the
    /// known fields with the preserved extras
    #[must_use]
    pub fn mcp_to_value(&self) -> Value {
        let Self::McpServer {
            transport,
            command,
            args,
            env,
            url,
            extra,
        } = self
        else {
            return Value::Null;
        };

        let mut obj = Map::new();
        obj.insert(
            "type".into(),
            Value::String(
                match transport {
                    McpTransport::Stdio => "stdio",
                    McpTransport::Http => "http",
                    McpTransport::Sse => "sse",
                }
                .to_string(),
            ),
        );
        if let Some(cmd) = command {
            obj.insert("command".into(), Value::String(cmd.clone()));
        }
        if !args.is_empty() {
            obj.insert(
                "args".into(),
                Value::Array(args.iter().map(|a| Value::String(a.clone())).collect()),
            );
        }
        if !env.is_empty() {
            obj.insert(
                "env".into(),
                Value::Object(
                    env.iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                ),
            );
        }
        if let Some(u) = url {
            obj.insert("url".into(), Value::String(u.clone()));
        }
        for (k, v) in extra {
            obj.insert(k.clone(), v.clone());
        }
        Value::Object(obj)
    }
}
