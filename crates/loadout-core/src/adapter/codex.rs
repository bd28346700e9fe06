//! Codex adapter
//!
//! A single user-global TOML config plus a prompts directory. MCP servers
//! live in `[mcp_servers.<name>]` tables with an inverted `enabled = false`
//! disable flag; prompts are markdown files disabled by rename. Codex has
//! no skills, no hooks, and no project/local/managed scope.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::document::write_atomic;
use crate::config::{ConfigService, DocumentReadOutcome};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    validate_name, NormalizedTool, ToolKind, ToolMetadata, ToolScope, ToolSource, ToolStatus,
};
use crate::parser::codex;
use crate::parser::frontmatter::parse_command_file;
use crate::schema;
use crate::watch::WatchPath;

use super::{scope_not_supported, AdapterEnv, PlatformAdapter, PlatformId, ToggleOutcome};

const PLATFORM: &str = "codex";
const DISABLED_SUFFIX: &str = ".disabled";

/// Adapter for OpenAI Codex
pub struct CodexAdapter {
    env: AdapterEnv,
}

impl CodexAdapter {
    #[must_use]
    pub fn new(env: AdapterEnv) -> Self {
        Self { env }
    }

    fn codex_dir(&self) -> PathBuf {
        self.env.home.join(".codex")
    }

    fn config_path(&self) -> PathBuf {
        self.codex_dir().join("config.toml")
    }

    fn prompts_dir(&self) -> PathBuf {
        self.codex_dir().join("prompts")
    }

    fn read_mcp(&self, service: &ConfigService) -> ConfigResult<Vec<NormalizedTool>> {
        let path = self.config_path();
        let doc = match service.read_document(&path, schema::CODEX_CONFIG) {
            DocumentReadOutcome::NotFound => return Ok(Vec::new()),
            DocumentReadOutcome::Malformed { detail } => {
                return Ok(vec![error_entry(
                    ToolKind::McpServer,
                    "config.toml".into(),
                    ToolSource::file(&path),
                    detail,
                )]);
            }
            DocumentReadOutcome::Loaded(doc) => doc,
        };

        let mut tools = Vec::new();
        for (name, config) in codex::server_entries(&doc.value) {
            let status = if codex::is_enabled(&config) {
                ToolStatus::Enabled
            } else {
                ToolStatus::Disabled
            };
            // The enabled flag is a disable encoding, not server config;
            // strip it from metadata so round-trips stay clean
            let mut config = config;
            if let Some(obj) = config.as_object_mut() {
                obj.remove("enabled");
            }
            tools.push(finish(NormalizedTool {
                id: String::new(),
                kind: ToolKind::McpServer,
                scope: ToolScope::User,
                status,
                status_detail: None,
                name,
                description: None,
                source: ToolSource::file(&path),
                metadata: ToolMetadata::mcp_from_value(&config),
            }));
        }
        Ok(tools)
    }

    fn read_prompts(&self, scope: ToolScope) -> ConfigResult<Vec<NormalizedTool>> {
        let dir = self.prompts_dir();
        if scope != ToolScope::User || !dir.exists() {
            return Ok(Vec::new());
        }

        let mut tools = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| ConfigError::io(&dir, &e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::io(&dir, &e))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            let entry_name = file_name(&path);
            let (name, disabled) = match entry_name.strip_suffix(".md.disabled") {
                Some(stem) => (stem.to_string(), true),
                None => match entry_name.strip_suffix(".md") {
                    Some(stem) => (stem.to_string(), false),
                    None => continue,
                },
            };
            let source = ToolSource::file(&path);

            let tool = match fs::read_to_string(&path) {
                Err(e) => error_entry(
                    ToolKind::Command,
                    name,
                    source,
                    format!("read failed: {e}"),
                ),
                Ok(content) => match parse_command_file(&path, &content) {
                    Err(e) => error_entry(ToolKind::Command, name, source, e.to_string()),
                    Ok(cmd) => finish(NormalizedTool {
                        id: String::new(),
                        kind: ToolKind::Command,
                        scope: ToolScope::User,
                        status: if disabled {
                            ToolStatus::Disabled
                        } else {
                            ToolStatus::Enabled
                        },
                        status_detail: None,
                        name,
                        description: cmd.description,
                        source,
                        metadata: ToolMetadata::Command {
                            argument_hint: cmd.argument_hint,
                            model: cmd.model,
                            content: Some(content),
                            extra: cmd.extra,
                        },
                    }),
                },
            };
            tools.push(tool);
        }
        Ok(tools)
    }

    fn toggle_mcp(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        enable: bool,
    ) -> ConfigResult<ToggleOutcome> {
        // Recompute the current state from the config on disk
        let current = self
            .read_mcp(service)?
            .into_iter()
            .find(|t| t.name == tool.name)
            .ok_or_else(|| ConfigError::ToolNotFound {
                name: tool.name.clone(),
            })?;
        if current.status.is_enabled() == enable {
            return Ok(ToggleOutcome::AlreadyInState);
        }

        let name = tool.name.clone();
        service.write_document(&self.config_path(), schema::CODEX_CONFIG, move |value| {
            if codex::set_enabled(value, &name, enable) {
                Ok(())
            } else {
                Err(ConfigError::ToolNotFound { name })
            }
        })?;
        Ok(ToggleOutcome::Changed)
    }

    fn toggle_prompt(&self, tool: &NormalizedTool, enable: bool) -> ConfigResult<ToggleOutcome> {
        let enabled_path = self.prompts_dir().join(format!("{}.md", tool.name));
        let disabled_path = self
            .prompts_dir()
            .join(format!("{}.md{DISABLED_SUFFIX}", tool.name));

        let (target_exists, other) = if enable {
            (enabled_path.exists(), &disabled_path)
        } else {
            (disabled_path.exists(), &enabled_path)
        };
        if target_exists {
            return Ok(ToggleOutcome::AlreadyInState);
        }
        if !other.exists() {
            return Err(ConfigError::ToolNotFound {
                name: tool.name.clone(),
            });
        }
        let (from, to) = if enable {
            (&disabled_path, &enabled_path)
        } else {
            (&enabled_path, &disabled_path)
        };
        fs::rename(from, to).map_err(|e| ConfigError::io(from, &e))?;
        Ok(ToggleOutcome::Changed)
    }
}

impl PlatformAdapter for CodexAdapter {
    fn id(&self) -> PlatformId {
        PlatformId::Codex
    }

    fn display_name(&self) -> &'static str {
        "Codex"
    }

    fn detect(&self) -> bool {
        self.codex_dir().is_dir()
    }

    fn read_tools(
        &self,
        service: &ConfigService,
        kind: ToolKind,
        scope: ToolScope,
    ) -> ConfigResult<Vec<NormalizedTool>> {
        if scope != ToolScope::User {
            return Ok(Vec::new());
        }
        match kind {
            ToolKind::McpServer => self.read_mcp(service),
            ToolKind::Command => self.read_prompts(scope),
            ToolKind::Skill | ToolKind::Hook => Ok(Vec::new()),
        }
    }

    fn write_tool(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        scope: ToolScope,
    ) -> ConfigResult<()> {
        if scope != ToolScope::User {
            return Err(scope_not_supported(PLATFORM, scope, "tool writes"));
        }
        validate_name(&tool.name)?;
        debug!(name = %tool.name, kind = %tool.kind, "writing tool");

        match &tool.metadata {
            ToolMetadata::McpServer { .. } => {
                let name = tool.name.clone();
                let config = tool.metadata.mcp_to_value();
                service.write_document(&self.config_path(), schema::CODEX_CONFIG, move |value| {
                    codex::insert_server(value, &name, config);
                    Ok(())
                })
            }
            ToolMetadata::Command { content, .. } => {
                let content = content.as_deref().ok_or_else(|| {
                    ConfigError::Internal("prompt has no file content to write".into())
                })?;
                let path = self.prompts_dir().join(format!("{}.md", tool.name));
                write_atomic(&path, content)
            }
            ToolMetadata::Skill { .. } | ToolMetadata::Hook { .. } => Err(scope_not_supported(
                PLATFORM,
                scope,
                tool.kind.display_name(),
            )),
        }
    }

    fn remove_tool(&self, service: &ConfigService, tool: &NormalizedTool) -> ConfigResult<()> {
        debug!(name = %tool.name, kind = %tool.kind, "removing tool");
        match tool.kind {
            ToolKind::McpServer => {
                let name = tool.name.clone();
                service.write_document(&self.config_path(), schema::CODEX_CONFIG, move |value| {
                    if codex::remove_server(value, &name) {
                        Ok(())
                    } else {
                        Err(ConfigError::ToolNotFound { name })
                    }
                })
            }
            ToolKind::Command => {
                let enabled = self.prompts_dir().join(format!("{}.md", tool.name));
                let disabled = self
                    .prompts_dir()
                    .join(format!("{}.md{DISABLED_SUFFIX}", tool.name));
                let target = [enabled, disabled]
                    .into_iter()
                    .find(|p| p.exists())
                    .ok_or_else(|| ConfigError::ToolNotFound {
                        name: tool.name.clone(),
                    })?;
                fs::remove_file(&target).map_err(|e| ConfigError::io(&target, &e))
            }
            ToolKind::Skill | ToolKind::Hook => Err(scope_not_supported(
                PLATFORM,
                tool.scope,
                tool.kind.display_name(),
            )),
        }
    }

    fn toggle_tool(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        enable: bool,
    ) -> ConfigResult<ToggleOutcome> {
        match tool.kind {
            ToolKind::McpServer => self.toggle_mcp(service, tool, enable),
            ToolKind::Command => self.toggle_prompt(tool, enable),
            ToolKind::Skill | ToolKind::Hook => Err(scope_not_supported(
                PLATFORM,
                tool.scope,
                tool.kind.display_name(),
            )),
        }
    }

    fn watch_paths(&self, scope: ToolScope) -> Vec<WatchPath> {
        if scope != ToolScope::User {
            return Vec::new();
        }
        let mut paths = vec![WatchPath::recursive(self.prompts_dir())];
        paths.extend(WatchPath::file_parent(self.config_path()));
        paths
    }

    fn mcp_file_path(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        if scope == ToolScope::User {
            Ok(self.config_path())
        } else {
            Err(scope_not_supported(PLATFORM, scope, "MCP config file"))
        }
    }

    fn mcp_schema_key(&self, scope: ToolScope) -> ConfigResult<&'static str> {
        self.mcp_file_path(scope).map(|_| schema::CODEX_CONFIG)
    }

    fn skills_dir(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        Err(scope_not_supported(PLATFORM, scope, "skills directory"))
    }

    fn commands_dir(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        if scope == ToolScope::User {
            Ok(self.prompts_dir())
        } else {
            Err(scope_not_supported(PLATFORM, scope, "prompts directory"))
        }
    }

    fn settings_path(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        Err(scope_not_supported(PLATFORM, scope, "settings file"))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn error_entry(
    kind: ToolKind,
    name: String,
    source: ToolSource,
    detail: String,
) -> NormalizedTool {
    finish(NormalizedTool {
        id: String::new(),
        kind,
        scope: ToolScope::User,
        status: ToolStatus::Error,
        status_detail: Some(detail),
        name,
        description: None,
        source,
        metadata: ToolMetadata::default_for(kind),
    })
}

fn finish(mut tool: NormalizedTool) -> NormalizedTool {
    tool.id = tool.canonical_key();
    tool
}
