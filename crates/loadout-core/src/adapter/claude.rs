//! Claude Code adapter
//!
//! JSON config documents plus markdown tool directories. Three disable
//! encodings coexist on this platform and each is applied exactly where
//! the source uses it:
//! - MCP servers: name listed in `disabledMcpjsonServers` inside the
//!   scope's settings document
//! - skills and commands: `.disabled` rename suffix on the directory or
//!   file
//! - hooks: `disabled: true` flag on the matcher entry in settings

use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::document::write_atomic;
use crate::config::{ConfigService, DocumentReadOutcome};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    validate_name, NormalizedTool, ToolKind, ToolMetadata, ToolScope, ToolSource, ToolStatus,
};
use crate::parser::frontmatter::{parse_command_file, parse_skill_manifest};
use crate::parser::mcp;
use crate::schema;
use crate::watch::WatchPath;

use super::{scope_not_supported, AdapterEnv, PlatformAdapter, PlatformId, ToggleOutcome};

const PLATFORM: &str = "claude";
const DISABLED_SUFFIX: &str = ".disabled";
const DISABLED_SERVERS_KEY: &str = "disabledMcpjsonServers";

/// Adapter for Claude Code
pub struct ClaudeAdapter {
    env: AdapterEnv,
}

impl ClaudeAdapter {
    #[must_use]
    pub fn new(env: AdapterEnv) -> Self {
        Self { env }
    }

    fn user_dir(&self) -> PathBuf {
        self.env.home.join(".claude")
    }

    fn project_dir(&self) -> Option<PathBuf> {
        self.env.project_root.as_ref().map(|root| root.join(".claude"))
    }

    fn require_project_dir(&self) -> ConfigResult<PathBuf> {
        self.project_dir()
            .ok_or_else(|| ConfigError::Internal("no project workspace open".into()))
    }

    /// Whether reads for this scope can proceed at all
    fn scope_available(&self, scope: ToolScope) -> bool {
        match scope {
            ToolScope::User | ToolScope::Managed => true,
            ToolScope::Project | ToolScope::Local => self.env.project_root.is_some(),
        }
    }

    fn ensure_writable(scope: ToolScope) -> ConfigResult<()> {
        if scope.is_writable() {
            Ok(())
        } else {
            Err(ConfigError::ManagedScope)
        }
    }

    // -- MCP servers ------------------------------------------------------

    /// The disabled-server list from the scope's settings document
    ///
    /// A missing or malformed settings file contributes an empty list; the
    /// MCP read itself still proceeds.
    fn disabled_servers(&self, service: &ConfigService, scope: ToolScope) -> Vec<String> {
        let Ok(path) = self.settings_path(scope) else {
            return Vec::new();
        };
        let Some(doc) = service
            .read_document(&path, schema::CLAUDE_SETTINGS)
            .loaded()
        else {
            return Vec::new();
        };
        doc.value
            .get(DISABLED_SERVERS_KEY)
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read_mcp(
        &self,
        service: &ConfigService,
        scope: ToolScope,
    ) -> ConfigResult<Vec<NormalizedTool>> {
        let path = self.mcp_file_path(scope)?;
        let doc = match service.read_document(&path, schema::MCP_DOCUMENT) {
            DocumentReadOutcome::NotFound => return Ok(Vec::new()),
            DocumentReadOutcome::Malformed { detail } => {
                return Ok(vec![error_entry(
                    ToolKind::McpServer,
                    scope,
                    file_name(&path),
                    ToolSource::file(&path),
                    detail,
                )]);
            }
            DocumentReadOutcome::Loaded(doc) => doc,
        };

        let disabled = self.disabled_servers(service, scope);
        let mut tools = Vec::new();
        for (name, config) in mcp::server_entries(&doc.value) {
            let status = if disabled.contains(&name) {
                ToolStatus::Disabled
            } else {
                ToolStatus::Enabled
            };
            tools.push(finish(NormalizedTool {
                id: String::new(),
                kind: ToolKind::McpServer,
                scope,
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

    fn toggle_mcp(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        enable: bool,
    ) -> ConfigResult<ToggleOutcome> {
        let disabled = self.disabled_servers(service, tool.scope);
        let currently_enabled = !disabled.contains(&tool.name);
        if currently_enabled == enable {
            return Ok(ToggleOutcome::AlreadyInState);
        }

        let settings = self.settings_path(tool.scope)?;
        let name = tool.name.clone();
        service.write_document(&settings, schema::CLAUDE_SETTINGS, move |value| {
            let root = value
                .as_object_mut()
                .ok_or_else(|| ConfigError::Internal("settings root is not an object".into()))?;
            let list = root
                .entry(DISABLED_SERVERS_KEY)
                .or_insert_with(|| Value::Array(Vec::new()));
            let Some(list) = list.as_array_mut() else {
                return Err(ConfigError::Internal(format!(
                    "'{DISABLED_SERVERS_KEY}' is not an array"
                )));
            };
            if enable {
                list.retain(|v| v.as_str() != Some(name.as_str()));
            } else {
                list.push(Value::String(name.clone()));
            }
            Ok(())
        })?;
        Ok(ToggleOutcome::Changed)
    }

    // -- Skills -----------------------------------------------------------

    fn read_skills(&self, scope: ToolScope) -> ConfigResult<Vec<NormalizedTool>> {
        let dir = self.skills_dir(scope)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut tools = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| ConfigError::io(&dir, &e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::io(&dir, &e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let dir_name = file_name(&path);
            if dir_name.starts_with('.') {
                continue;
            }
            let (name, disabled) = match dir_name.strip_suffix(DISABLED_SUFFIX) {
                Some(base) => (base.to_string(), true),
                None => (dir_name, false),
            };

            let manifest_path = path.join("SKILL.md");
            let source = ToolSource::directory(&manifest_path, &path);
            let tool = match fs::read_to_string(&manifest_path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    let mut t = error_entry(
                        ToolKind::Skill,
                        scope,
                        name,
                        source,
                        "missing SKILL.md".into(),
                    );
                    t.status = ToolStatus::Warning;
                    t
                }
                Err(e) => error_entry(
                    ToolKind::Skill,
                    scope,
                    name,
                    source,
                    format!("read failed: {e}"),
                ),
                Ok(content) => match parse_skill_manifest(&manifest_path, &content) {
                    Err(e) => error_entry(ToolKind::Skill, scope, name, source, e.to_string()),
                    Ok(manifest) => {
                        let mut files = std::collections::BTreeMap::new();
                        collect_skill_files(&path, &path, &mut files)?;
                        finish(NormalizedTool {
                            id: String::new(),
                            kind: ToolKind::Skill,
                            scope,
                            status: if disabled {
                                ToolStatus::Disabled
                            } else {
                                ToolStatus::Enabled
                            },
                            status_detail: None,
                            name,
                            description: manifest.description,
                            source,
                            metadata: ToolMetadata::Skill {
                                allowed_tools: manifest.allowed_tools,
                                model: manifest.model,
                                content: Some(content),
                                files,
                                extra: manifest.extra,
                            },
                        })
                    }
                },
            };
            tools.push(tool);
        }
        Ok(tools)
    }

    fn toggle_skill(&self, tool: &NormalizedTool, enable: bool) -> ConfigResult<ToggleOutcome> {
        let dir = self.skills_dir(tool.scope)?;
        let enabled_dir = dir.join(&tool.name);
        let disabled_dir = dir.join(format!("{}{DISABLED_SUFFIX}", tool.name));
        toggle_by_rename(&enabled_dir, &disabled_dir, &tool.name, enable)
    }

    // -- Commands ---------------------------------------------------------

    fn read_commands(&self, scope: ToolScope) -> ConfigResult<Vec<NormalizedTool>> {
        let dir = self.commands_dir(scope)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut tools = Vec::new();
        collect_commands(&dir, "", scope, &mut tools)?;
        Ok(tools)
    }

    fn toggle_command(&self, tool: &NormalizedTool, enable: bool) -> ConfigResult<ToggleOutcome> {
        // Derive both forms from the observed source path so namespaced
        // commands in subdirectories toggle correctly
        let enabled_path = match tool.source.file_path.to_string_lossy().strip_suffix(DISABLED_SUFFIX) {
            Some(base) => PathBuf::from(base),
            None => tool.source.file_path.clone(),
        };
        let disabled_path = PathBuf::from(format!(
            "{}{DISABLED_SUFFIX}",
            enabled_path.to_string_lossy()
        ));
        toggle_by_rename(&enabled_path, &disabled_path, &tool.name, enable)
    }

    // -- Hooks ------------------------------------------------------------

    fn read_hooks(
        &self,
        service: &ConfigService,
        scope: ToolScope,
    ) -> ConfigResult<Vec<NormalizedTool>> {
        let path = self.settings_path(scope)?;
        let doc = match service.read_document(&path, schema::CLAUDE_SETTINGS) {
            DocumentReadOutcome::NotFound => return Ok(Vec::new()),
            DocumentReadOutcome::Malformed { detail } => {
                return Ok(vec![error_entry(
                    ToolKind::Hook,
                    scope,
                    file_name(&path),
                    ToolSource::file(&path),
                    detail,
                )]);
            }
            DocumentReadOutcome::Loaded(doc) => doc,
        };

        let Some(hooks) = doc.value.get("hooks").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let mut tools = Vec::new();
        for (event, entries) in hooks {
            let Some(entries) = entries.as_array() else {
                continue;
            };
            for (index, entry) in entries.iter().enumerate() {
                let Some(obj) = entry.as_object() else {
                    continue;
                };
                let matcher = obj.get("matcher").and_then(Value::as_str).map(String::from);
                let definitions = obj
                    .get("hooks")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let disabled = obj
                    .get("disabled")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let mut extra = Map::new();
                for (k, v) in obj {
                    if !matches!(k.as_str(), "matcher" | "hooks" | "disabled") {
                        extra.insert(k.clone(), v.clone());
                    }
                }

                let name = format!("{event}:{}", matcher.as_deref().unwrap_or("*"));
                tools.push(finish(NormalizedTool {
                    id: String::new(),
                    kind: ToolKind::Hook,
                    scope,
                    status: if disabled {
                        ToolStatus::Disabled
                    } else {
                        ToolStatus::Enabled
                    },
                    status_detail: None,
                    name,
                    description: None,
                    source: ToolSource::file(&path),
                    metadata: ToolMetadata::Hook {
                        event: event.clone(),
                        matcher,
                        index,
                        definitions,
                        extra,
                    },
                }));
            }
        }
        Ok(tools)
    }

    fn toggle_hook(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        enable: bool,
    ) -> ConfigResult<ToggleOutcome> {
        let ToolMetadata::Hook { event, index, .. } = &tool.metadata else {
            return Err(ConfigError::Internal("hook tool without hook metadata".into()));
        };

        let path = self.settings_path(tool.scope)?;
        let current = self
            .read_hooks(service, tool.scope)?
            .into_iter()
            .find(|t| t.canonical_key() == tool.canonical_key())
            .ok_or_else(|| ConfigError::ToolNotFound {
                name: tool.name.clone(),
            })?;
        if current.status.is_enabled() == enable {
            return Ok(ToggleOutcome::AlreadyInState);
        }

        let event = event.clone();
        let index = *index;
        let name = tool.name.clone();
        service.write_document(&path, schema::CLAUDE_SETTINGS, move |value| {
            let entry = value
                .get_mut("hooks")
                .and_then(|h| h.get_mut(&event))
                .and_then(Value::as_array_mut)
                .and_then(|entries| entries.get_mut(index))
                .and_then(Value::as_object_mut)
                .ok_or(ConfigError::ToolNotFound { name })?;
            if enable {
                entry.remove("disabled");
            } else {
                entry.insert("disabled".into(), Value::Bool(true));
            }
            Ok(())
        })?;
        Ok(ToggleOutcome::Changed)
    }
}

impl PlatformAdapter for ClaudeAdapter {
    fn id(&self) -> PlatformId {
        PlatformId::Claude
    }

    fn display_name(&self) -> &'static str {
        "Claude Code"
    }

    fn detect(&self) -> bool {
        self.user_dir().is_dir() || self.env.home.join(".claude.json").is_file()
    }

    fn read_tools(
        &self,
        service: &ConfigService,
        kind: ToolKind,
        scope: ToolScope,
    ) -> ConfigResult<Vec<NormalizedTool>> {
        if !self.scope_available(scope) {
            return Ok(Vec::new());
        }
        match (kind, scope) {
            (ToolKind::McpServer, ToolScope::User | ToolScope::Project) => {
                self.read_mcp(service, scope)
            }
            (ToolKind::Skill | ToolKind::Command, ToolScope::User | ToolScope::Project) => {
                if kind == ToolKind::Skill {
                    self.read_skills(scope)
                } else {
                    self.read_commands(scope)
                }
            }
            (ToolKind::Hook, _) => self.read_hooks(service, scope),
            _ => Ok(Vec::new()),
        }
    }

    fn write_tool(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        scope: ToolScope,
    ) -> ConfigResult<()> {
        Self::ensure_writable(scope)?;
        // Hook names embed the event and matcher; only names that become
        // file paths or document keys are validated
        if tool.kind != ToolKind::Hook {
            validate_name(&tool.name)?;
        }
        debug!(name = %tool.name, kind = %tool.kind, %scope, "writing tool");

        match &tool.metadata {
            ToolMetadata::McpServer { .. } => {
                let path = self.mcp_file_path(scope)?;
                let name = tool.name.clone();
                let config = tool.metadata.mcp_to_value();
                service.write_document(&path, schema::MCP_DOCUMENT, move |value| {
                    mcp::insert_server(value, &name, config);
                    Ok(())
                })
            }
            ToolMetadata::Skill { content, files, .. } => {
                let content = content.as_deref().ok_or_else(|| {
                    ConfigError::Internal("skill has no manifest content to write".into())
                })?;
                let skill_dir = self.skills_dir(scope)?.join(&tool.name);
                write_atomic(&skill_dir.join("SKILL.md"), content)?;
                for (relative, data) in files {
                    let relative_path = Path::new(relative);
                    if relative_path.is_absolute()
                        || relative_path
                            .components()
                            .any(|c| matches!(c, std::path::Component::ParentDir))
                    {
                        return Err(ConfigError::InvalidName(format!(
                            "skill file path escapes the skill directory: {relative}"
                        )));
                    }
                    write_atomic(&skill_dir.join(relative_path), data)?;
                }
                Ok(())
            }
            ToolMetadata::Command { content, .. } => {
                let content = content.as_deref().ok_or_else(|| {
                    ConfigError::Internal("command has no file content to write".into())
                })?;
                let path = self.commands_dir(scope)?.join(format!("{}.md", tool.name));
                write_atomic(&path, content)
            }
            ToolMetadata::Hook {
                event,
                matcher,
                definitions,
                extra,
                ..
            } => {
                let path = self.settings_path(scope)?;
                let mut entry = Map::new();
                if let Some(matcher) = matcher {
                    entry.insert("matcher".into(), Value::String(matcher.clone()));
                }
                entry.insert("hooks".into(), Value::Array(definitions.clone()));
                for (k, v) in extra {
                    entry.insert(k.clone(), v.clone());
                }
                let event = event.clone();
                service.write_document(&path, schema::CLAUDE_SETTINGS, move |value| {
                    let root = value.as_object_mut().ok_or_else(|| {
                        ConfigError::Internal("settings root is not an object".into())
                    })?;
                    let hooks = root.entry("hooks").or_insert_with(|| json!({}));
                    let Some(hooks) = hooks.as_object_mut() else {
                        return Err(ConfigError::Internal("'hooks' is not an object".into()));
                    };
                    let entries = hooks
                        .entry(event)
                        .or_insert_with(|| Value::Array(Vec::new()));
                    let Some(entries) = entries.as_array_mut() else {
                        return Err(ConfigError::Internal("hook event is not an array".into()));
                    };
                    entries.push(Value::Object(entry));
                    Ok(())
                })
            }
        }
    }

    fn remove_tool(&self, service: &ConfigService, tool: &NormalizedTool) -> ConfigResult<()> {
        Self::ensure_writable(tool.scope)?;
        debug!(name = %tool.name, kind = %tool.kind, scope = %tool.scope, "removing tool");

        match tool.kind {
            ToolKind::McpServer => {
                let path = self.mcp_file_path(tool.scope)?;
                let name = tool.name.clone();
                service.write_document(&path, schema::MCP_DOCUMENT, move |value| {
                    if mcp::remove_server(value, &name) {
                        Ok(())
                    } else {
                        Err(ConfigError::ToolNotFound { name })
                    }
                })
            }
            ToolKind::Skill => {
                let dir = self.skills_dir(tool.scope)?;
                let target = existing_of(
                    &dir.join(&tool.name),
                    &dir.join(format!("{}{DISABLED_SUFFIX}", tool.name)),
                )
                .ok_or_else(|| ConfigError::ToolNotFound {
                    name: tool.name.clone(),
                })?;
                fs::remove_dir_all(&target).map_err(|e| ConfigError::io(&target, &e))
            }
            ToolKind::Command => {
                let enabled = tool.source.file_path.clone();
                let enabled = match enabled.to_string_lossy().strip_suffix(DISABLED_SUFFIX) {
                    Some(base) => PathBuf::from(base),
                    None => enabled,
                };
                let disabled =
                    PathBuf::from(format!("{}{DISABLED_SUFFIX}", enabled.to_string_lossy()));
                let target =
                    existing_of(&enabled, &disabled).ok_or_else(|| ConfigError::ToolNotFound {
                        name: tool.name.clone(),
                    })?;
                fs::remove_file(&target).map_err(|e| ConfigError::io(&target, &e))
            }
            ToolKind::Hook => {
                let ToolMetadata::Hook { event, index, .. } = &tool.metadata else {
                    return Err(ConfigError::Internal(
                        "hook tool without hook metadata".into(),
                    ));
                };
                let path = self.settings_path(tool.scope)?;
                let event = event.clone();
                let index = *index;
                let name = tool.name.clone();
                service.write_document(&path, schema::CLAUDE_SETTINGS, move |value| {
                    let entries = value
                        .get_mut("hooks")
                        .and_then(|h| h.get_mut(&event))
                        .and_then(Value::as_array_mut)
                        .ok_or_else(|| ConfigError::ToolNotFound { name: name.clone() })?;
                    if index >= entries.len() {
                        return Err(ConfigError::ToolNotFound { name });
                    }
                    entries.remove(index);
                    Ok(())
                })
            }
        }
    }

    fn toggle_tool(
        &self,
        service: &ConfigService,
        tool: &NormalizedTool,
        enable: bool,
    ) -> ConfigResult<ToggleOutcome> {
        Self::ensure_writable(tool.scope)?;
        match tool.kind {
            ToolKind::McpServer => self.toggle_mcp(service, tool, enable),
            ToolKind::Skill => self.toggle_skill(tool, enable),
            ToolKind::Command => self.toggle_command(tool, enable),
            ToolKind::Hook => self.toggle_hook(service, tool, enable),
        }
    }

    fn watch_paths(&self, scope: ToolScope) -> Vec<WatchPath> {
        let mut paths = Vec::new();
        if let Ok(dir) = self.skills_dir(scope) {
            paths.push(WatchPath::recursive(dir));
        }
        if let Ok(dir) = self.commands_dir(scope) {
            paths.push(WatchPath::recursive(dir));
        }
        if let Ok(file) = self.mcp_file_path(scope) {
            paths.extend(WatchPath::file_parent(file));
        }
        if let Ok(file) = self.settings_path(scope) {
            paths.extend(WatchPath::file_parent(file));
        }
        paths.dedup();
        paths
    }

    fn mcp_file_path(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        match scope {
            ToolScope::User => Ok(self.env.home.join(".claude.json")),
            ToolScope::Project => {
                let root = self
                    .env
                    .project_root
                    .as_ref()
                    .ok_or_else(|| ConfigError::Internal("no project workspace open".into()))?;
                Ok(root.join(".mcp.json"))
            }
            ToolScope::Local | ToolScope::Managed => {
                Err(scope_not_supported(PLATFORM, scope, "MCP config file"))
            }
        }
    }

    fn mcp_schema_key(&self, scope: ToolScope) -> ConfigResult<&'static str> {
        self.mcp_file_path(scope).map(|_| schema::MCP_DOCUMENT)
    }

    fn skills_dir(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        match scope {
            ToolScope::User => Ok(self.user_dir().join("skills")),
            ToolScope::Project => Ok(self.require_project_dir()?.join("skills")),
            ToolScope::Local | ToolScope::Managed => {
                Err(scope_not_supported(PLATFORM, scope, "skills directory"))
            }
        }
    }

    fn commands_dir(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        match scope {
            ToolScope::User => Ok(self.user_dir().join("commands")),
            ToolScope::Project => Ok(self.require_project_dir()?.join("commands")),
            ToolScope::Local | ToolScope::Managed => {
                Err(scope_not_supported(PLATFORM, scope, "commands directory"))
            }
        }
    }

    fn settings_path(&self, scope: ToolScope) -> ConfigResult<PathBuf> {
        match scope {
            ToolScope::User => Ok(self.user_dir().join("settings.json")),
            ToolScope::Project => Ok(self.require_project_dir()?.join("settings.json")),
            ToolScope::Local => Ok(self.require_project_dir()?.join("settings.local.json")),
            ToolScope::Managed => Ok(self.env.managed_root.join("managed-settings.json")),
        }
    }
}

/// Recursively collect command files, namespacing subdirectories with `:`
fn collect_commands(
    dir: &Path,
    prefix: &str,
    scope: ToolScope,
    out: &mut Vec<NormalizedTool>,
) -> ConfigResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::io(dir, &e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::io(dir, &e))?;
        let path = entry.path();
        let entry_name = file_name(&path);
        if entry_name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_commands(&path, &format!("{prefix}{entry_name}:"), scope, out)?;
            continue;
        }

        let (stem, disabled) = match entry_name.strip_suffix(".md.disabled") {
            Some(stem) => (stem, true),
            None => match entry_name.strip_suffix(".md") {
                Some(stem) => (stem, false),
                None => continue,
            },
        };
        let name = format!("{prefix}{stem}");
        let source = ToolSource::file(&path);

        let tool = match fs::read_to_string(&path) {
            Err(e) => error_entry(
                ToolKind::Command,
                scope,
                name,
                source,
                format!("read failed: {e}"),
            ),
            Ok(content) => match parse_command_file(&path, &content) {
                Err(e) => error_entry(ToolKind::Command, scope, name, source, e.to_string()),
                Ok(cmd) => finish(NormalizedTool {
                    id: String::new(),
                    kind: ToolKind::Command,
                    scope,
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
        out.push(tool);
    }
    Ok(())
}

/// Gather the skill directory's files beyond the manifest, keyed by path
/// relative to the skill root
///
/// Non-UTF-8 files are skipped; the bundle format carries text content.
fn collect_skill_files(
    root: &Path,
    dir: &Path,
    out: &mut std::collections::BTreeMap<String, String>,
) -> ConfigResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::io(dir, &e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::io(dir, &e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_skill_files(root, &path, out)?;
            continue;
        }
        if path == root.join("SKILL.md") {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if let Ok(content) = fs::read_to_string(&path) {
            out.insert(relative.to_string_lossy().into_owned(), content);
        }
    }
    Ok(())
}

/// Toggle a rename-encoded tool between its enabled and disabled paths
fn toggle_by_rename(
    enabled: &Path,
    disabled: &Path,
    name: &str,
    enable: bool,
) -> ConfigResult<ToggleOutcome> {
    let (target_exists, other) = if enable {
        (enabled.exists(), disabled)
    } else {
        (disabled.exists(), enabled)
    };
    if target_exists {
        return Ok(ToggleOutcome::AlreadyInState);
    }
    if !other.exists() {
        return Err(ConfigError::ToolNotFound {
            name: name.to_string(),
        });
    }
    let (from, to) = if enable {
        (disabled, enabled)
    } else {
        (enabled, disabled)
    };
    fs::rename(from, to).map_err(|e| ConfigError::io(from, &e))?;
    Ok(ToggleOutcome::Changed)
}

fn existing_of(a: &Path, b: &Path) -> Option<PathBuf> {
    if a.exists() {
        Some(a.to_path_buf())
    } else if b.exists() {
        Some(b.to_path_buf())
    } else {
        None
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build an Error-status entry for a source that failed to read or parse
fn error_entry(
    kind: ToolKind,
    scope: ToolScope,
    name: String,
    source: ToolSource,
    detail: String,
) -> NormalizedTool {
    finish(NormalizedTool {
        id: String::new(),
        kind,
        scope,
        status: ToolStatus::Error,
        status_detail: Some(detail),
        name,
        description: None,
        source,
        metadata: ToolMetadata::default_for(kind),
    })
}

/// Assign the id from the canonical key once all fields are set
fn finish(mut tool: NormalizedTool) -> NormalizedTool {
    tool.id = tool.canonical_key();
    tool
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, ClaudeAdapter, ConfigService) {
        let dir = tempfile::tempdir().unwrap();
        let env = AdapterEnv::new(dir.path().to_path_buf())
            .with_project_root(dir.path().join("project"))
            .with_managed_root(dir.path().join("managed"));
        let service = ConfigService::new(dir.path().join("backups"));
        (dir, ClaudeAdapter::new(env), service)
    }

    fn write_json(path: &Path, value: &Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn test_read_mcp_with_disabled_list() {
        let (dir, adapter, service) = sandbox();
        write_json(
            &dir.path().join(".claude.json"),
            &json!({
                "mcpServers": {
                    "docs": {"type": "stdio", "command": "npx"},
                    "api": {"type": "http", "url": "https://x"}
                }
            }),
        );
        write_json(
            &dir.path().join(".claude/settings.json"),
            &json!({"disabledMcpjsonServers": ["api"]}),
        );

        let mut tools = adapter
            .read_tools(&service, ToolKind::McpServer, ToolScope::User)
            .unwrap();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "api");
        assert_eq!(tools[0].status, ToolStatus::Disabled);
        assert_eq!(tools[1].name, "docs");
        assert_eq!(tools[1].status, ToolStatus::Enabled);
    }

    #[test]
    fn test_malformed_mcp_yields_error_entry() {
        let (dir, adapter, service) = sandbox();
        fs::write(dir.path().join(".claude.json"), "{broken").unwrap();

        let tools = adapter
            .read_tools(&service, ToolKind::McpServer, ToolScope::User)
            .unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].status, ToolStatus::Error);
        assert!(tools[0].status_detail.is_some());
    }

    #[test]
    fn test_toggle_mcp_round_trip() {
        let (dir, adapter, service) = sandbox();
        write_json(
            &dir.path().join(".claude.json"),
            &json!({"mcpServers": {"docs": {"type": "stdio", "command": "npx"}}}),
        );

        let tools = adapter
            .read_tools(&service, ToolKind::McpServer, ToolScope::User)
            .unwrap();
        let tool = &tools[0];

        // Disable writes the name into the settings list
        assert_eq!(
            adapter.toggle_tool(&service, tool, false).unwrap(),
            ToggleOutcome::Changed
        );
        let settings: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join(".claude/settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings["disabledMcpjsonServers"][0], "docs");

        // A second disable is a no-op
        assert_eq!(
            adapter.toggle_tool(&service, tool, false).unwrap(),
            ToggleOutcome::AlreadyInState
        );

        // Re-enable removes it again
        assert_eq!(
            adapter.toggle_tool(&service, tool, true).unwrap(),
            ToggleOutcome::Changed
        );
        let settings: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join(".claude/settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings["disabledMcpjsonServers"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_toggle_mcp_backs_up_settings_first() {
        let (dir, adapter, service) = sandbox();
        write_json(
            &dir.path().join(".claude.json"),
            &json!({"mcpServers": {"docs": {"type": "stdio", "command": "npx"}}}),
        );
        let original = r#"{"disabledMcpjsonServers": []}"#;
        fs::create_dir_all(dir.path().join(".claude")).unwrap();
        fs::write(dir.path().join(".claude/settings.json"), original).unwrap();

        let tools = adapter
            .read_tools(&service, ToolKind::McpServer, ToolScope::User)
            .unwrap();
        adapter.toggle_tool(&service, &tools[0], false).unwrap();

        let backups = crate::config::backup::list_backups(
            &dir.path().join("backups"),
            "settings.json",
        )
        .unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), original);
    }

    #[test]
    fn test_read_skills_statuses() {
        let (dir, adapter, service) = sandbox();
        let skills = dir.path().join(".claude/skills");

        fs::create_dir_all(skills.join("alpha")).unwrap();
        fs::write(
            skills.join("alpha/SKILL.md"),
            "---\nname: alpha\ndescription: First\n---\nBody",
        )
        .unwrap();

        fs::create_dir_all(skills.join("beta.disabled")).unwrap();
        fs::write(
            skills.join("beta.disabled/SKILL.md"),
            "---\nname: beta\ndescription: Second\n---\nBody",
        )
        .unwrap();

        fs::create_dir_all(skills.join("broken")).unwrap();

        let mut tools = adapter
            .read_tools(&service, ToolKind::Skill, ToolScope::User)
            .unwrap();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0].name, "alpha");
        assert_eq!(tools[0].status, ToolStatus::Enabled);
        assert_eq!(tools[1].name, "beta");
        assert_eq!(tools[1].status, ToolStatus::Disabled);
        assert_eq!(tools[2].name, "broken");
        assert_eq!(tools[2].status, ToolStatus::Warning);
    }

    #[test]
    fn test_read_skill_collects_directory_files() {
        let (dir, adapter, service) = sandbox();
        let skill = dir.path().join(".claude/skills/analyzer");
        fs::create_dir_all(skill.join("scripts")).unwrap();
        fs::write(skill.join("SKILL.md"), "---\nname: analyzer\n---\nBody").unwrap();
        fs::write(skill.join("reference.md"), "Extra docs").unwrap();
        fs::write(skill.join("scripts/helper.py"), "print('hi')\n").unwrap();

        let tools = adapter
            .read_tools(&service, ToolKind::Skill, ToolScope::User)
            .unwrap();
        let ToolMetadata::Skill { files, .. } = &tools[0].metadata else {
            panic!("expected skill metadata");
        };
        assert_eq!(files.len(), 2);
        assert_eq!(files.get("reference.md").map(String::as_str), Some("Extra docs"));
        assert_eq!(
            files.get("scripts/helper.py").map(String::as_str),
            Some("print('hi')\n")
        );
    }

    #[test]
    fn test_write_skill_recreates_directory_files() {
        let (dir, adapter, service) = sandbox();
        let mut files = std::collections::BTreeMap::new();
        files.insert("scripts/helper.py".to_string(), "print('hi')\n".to_string());
        let tool = finish(NormalizedTool {
            id: String::new(),
            kind: ToolKind::Skill,
            scope: ToolScope::User,
            status: ToolStatus::Enabled,
            status_detail: None,
            name: "analyzer".into(),
            description: None,
            source: ToolSource::file(dir.path().join(".claude/skills/analyzer/SKILL.md")),
            metadata: ToolMetadata::Skill {
                allowed_tools: Vec::new(),
                model: None,
                content: Some("---\nname: analyzer\n---\nBody".into()),
                files,
                extra: Map::new(),
            },
        });

        adapter.write_tool(&service, &tool, ToolScope::User).unwrap();
        let root = dir.path().join(".claude/skills/analyzer");
        assert!(root.join("SKILL.md").is_file());
        assert_eq!(
            fs::read_to_string(root.join("scripts/helper.py")).unwrap(),
            "print('hi')\n"
        );
    }

    #[test]
    fn test_write_skill_rejects_escaping_file_path() {
        let (dir, adapter, service) = sandbox();
        let mut files = std::collections::BTreeMap::new();
        files.insert("../outside.txt".to_string(), "nope".to_string());
        let tool = finish(NormalizedTool {
            id: String::new(),
            kind: ToolKind::Skill,
            scope: ToolScope::User,
            status: ToolStatus::Enabled,
            status_detail: None,
            name: "analyzer".into(),
            description: None,
            source: ToolSource::file(dir.path().join(".claude/skills/analyzer/SKILL.md")),
            metadata: ToolMetadata::Skill {
                allowed_tools: Vec::new(),
                model: None,
                content: Some("---\nname: analyzer\n---\nBody".into()),
                files,
                extra: Map::new(),
            },
        });

        let result = adapter.write_tool(&service, &tool, ToolScope::User);
        assert!(matches!(result, Err(ConfigError::InvalidName(_))));
        assert!(!dir.path().join(".claude/skills/outside.txt").exists());
    }

    #[test]
    fn test_skill_key_stable_across_toggle() {
        let (dir, adapter, service) = sandbox();
        let skills = dir.path().join(".claude/skills");
        fs::create_dir_all(skills.join("alpha")).unwrap();
        fs::write(skills.join("alpha/SKILL.md"), "---\nname: alpha\n---\nBody").unwrap();

        let before = adapter
            .read_tools(&service, ToolKind::Skill, ToolScope::User)
            .unwrap();
        adapter.toggle_tool(&service, &before[0], false).unwrap();
        assert!(skills.join("alpha.disabled").is_dir());

        let after = adapter
            .read_tools(&service, ToolKind::Skill, ToolScope::User)
            .unwrap();
        assert_eq!(before[0].canonical_key(), after[0].canonical_key());
        assert_eq!(after[0].status, ToolStatus::Disabled);
    }

    #[test]
    fn test_read_commands_with_namespacing() {
        let (dir, adapter, service) = sandbox();
        let commands = dir.path().join(".claude/commands");
        fs::create_dir_all(commands.join("git")).unwrap();
        fs::write(commands.join("review.md"), "---\ndescription: Review\n---\nGo").unwrap();
        fs::write(commands.join("old.md.disabled"), "Old body").unwrap();
        fs::write(commands.join("git/commit.md"), "Commit body").unwrap();

        let mut tools = adapter
            .read_tools(&service, ToolKind::Command, ToolScope::User)
            .unwrap();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0].name, "git:commit");
        assert_eq!(tools[1].name, "old");
        assert_eq!(tools[1].status, ToolStatus::Disabled);
        assert_eq!(tools[2].name, "review");
        assert_eq!(tools[2].description.as_deref(), Some("Review"));
    }

    #[test]
    fn test_toggle_command_rename() {
        let (dir, adapter, service) = sandbox();
        let commands = dir.path().join(".claude/commands");
        fs::create_dir_all(&commands).unwrap();
        fs::write(commands.join("review.md"), "Body").unwrap();

        let tools = adapter
            .read_tools(&service, ToolKind::Command, ToolScope::User)
            .unwrap();
        adapter.toggle_tool(&service, &tools[0], false).unwrap();
        assert!(commands.join("review.md.disabled").is_file());
        assert!(!commands.join("review.md").exists());

        adapter.toggle_tool(&service, &tools[0], true).unwrap();
        assert!(commands.join("review.md").is_file());
    }

    #[test]
    fn test_read_hooks_all_scopes() {
        let (dir, adapter, service) = sandbox();
        write_json(
            &dir.path().join(".claude/settings.json"),
            &json!({
                "hooks": {
                    "PreToolUse": [
                        {"matcher": "Bash", "hooks": [{"type": "command", "command": "lint"}]},
                        {"hooks": [{"type": "command", "command": "audit"}], "disabled": true}
                    ]
                }
            }),
        );
        write_json(
            &dir.path().join("managed/managed-settings.json"),
            &json!({
                "hooks": {"SessionStart": [{"hooks": []}]}
            }),
        );

        let user = adapter
            .read_tools(&service, ToolKind::Hook, ToolScope::User)
            .unwrap();
        assert_eq!(user.len(), 2);
        assert_eq!(user[0].canonical_key(), "hook:user:PreToolUse:Bash:0");
        assert_eq!(user[0].status, ToolStatus::Enabled);
        assert_eq!(user[1].canonical_key(), "hook:user:PreToolUse:*:1");
        assert_eq!(user[1].status, ToolStatus::Disabled);

        let managed = adapter
            .read_tools(&service, ToolKind::Hook, ToolScope::Managed)
            .unwrap();
        assert_eq!(managed.len(), 1);
        assert_eq!(managed[0].scope, ToolScope::Managed);
    }

    #[test]
    fn test_toggle_hook_flag() {
        let (dir, adapter, service) = sandbox();
        write_json(
            &dir.path().join(".claude/settings.json"),
            &json!({
                "hooks": {"PreToolUse": [{"matcher": "Bash", "hooks": []}]}
            }),
        );

        let tools = adapter
            .read_tools(&service, ToolKind::Hook, ToolScope::User)
            .unwrap();
        assert_eq!(
            adapter.toggle_tool(&service, &tools[0], false).unwrap(),
            ToggleOutcome::Changed
        );

        let settings: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join(".claude/settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(settings["hooks"]["PreToolUse"][0]["disabled"], true);

        assert_eq!(
            adapter.toggle_tool(&service, &tools[0], false).unwrap(),
            ToggleOutcome::AlreadyInState
        );
    }

    #[test]
    fn test_managed_scope_rejects_writes() {
        let (dir, adapter, service) = sandbox();
        write_json(
            &dir.path().join("managed/managed-settings.json"),
            &json!({"hooks": {"SessionStart": [{"hooks": []}]}}),
        );
        let tools = adapter
            .read_tools(&service, ToolKind::Hook, ToolScope::Managed)
            .unwrap();
        let result = adapter.toggle_tool(&service, &tools[0], false);
        assert!(matches!(result, Err(ConfigError::ManagedScope)));
    }

    #[test]
    fn test_project_scope_without_root_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let env = AdapterEnv::new(dir.path().to_path_buf());
        let adapter = ClaudeAdapter::new(env);
        let service = ConfigService::new(dir.path().join("backups"));
        for &kind in ToolKind::all() {
            assert!(adapter
                .read_tools(&service, kind, ToolScope::Project)
                .unwrap()
                .is_empty());
        }
    }

    #[test]
    fn test_write_and_remove_mcp_server() {
        let (dir, adapter, service) = sandbox();
        let tool = finish(NormalizedTool {
            id: String::new(),
            kind: ToolKind::McpServer,
            scope: ToolScope::User,
            status: ToolStatus::Enabled,
            status_detail: None,
            name: "docs".into(),
            description: None,
            source: ToolSource::file(dir.path().join(".claude.json")),
            metadata: ToolMetadata::mcp_from_value(&json!({
                "type": "stdio", "command": "npx", "args": ["-y", "docs-mcp"]
            })),
        });

        adapter.write_tool(&service, &tool, ToolScope::User).unwrap();
        let tools = adapter
            .read_tools(&service, ToolKind::McpServer, ToolScope::User)
            .unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "docs");

        adapter.remove_tool(&service, &tools[0]).unwrap();
        assert!(adapter
            .read_tools(&service, ToolKind::McpServer, ToolScope::User)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_watch_paths_user_scope() {
        let (_dir, adapter, _service) = sandbox();
        let paths = adapter.watch_paths(ToolScope::User);
        assert!(paths.iter().any(|w| w.recursive));
        assert!(paths.iter().any(|w| !w.recursive));
    }
}
