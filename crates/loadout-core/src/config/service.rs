//! The config service: schema-checked, backed-up, crash-safe mutations

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::adapter::PlatformAdapter;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{NormalizedTool, ToolKind, ToolScope};
use crate::schema::SchemaRegistry;

use super::backup::create_backup;
use super::document::{write_atomic, ConfigDocument, DocumentFormat};

/// Outcome of reading one config file
///
/// A missing file is a normal, silent case. Structurally invalid content
/// is a distinct outcome surfaced to the caller, never a raised fault that
/// aborts an unrelated batch read.
#[derive(Debug)]
pub enum DocumentReadOutcome {
    Loaded(ConfigDocument),
    NotFound,
    Malformed { detail: String },
}

impl DocumentReadOutcome {
    /// The parsed document, if one was loaded
    #[must_use]
    pub fn loaded(self) -> Option<ConfigDocument> {
        match self {
            Self::Loaded(doc) => Some(doc),
            _ => None,
        }
    }
}

/// The only component allowed to mutate a config file on disk
pub struct ConfigService {
    schemas: SchemaRegistry,
    backup_dir: PathBuf,
}

impl ConfigService {
    /// Service with the built-in schema registry
    ///
    /// Every construction names a backup directory; pre-write backups are
    /// part of the write contract, not an opt-in.
    #[must_use]
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            schemas: SchemaRegistry::builtin(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Replace the schema registry
    #[must_use]
    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    /// Read and validate one config file
    pub fn read_document(&self, path: &Path, schema_key: &str) -> DocumentReadOutcome {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return DocumentReadOutcome::NotFound
            }
            Err(e) => {
                return DocumentReadOutcome::Malformed {
                    detail: format!("read failed: {e}"),
                }
            }
        };

        let doc = match ConfigDocument::parse(path, &content) {
            Ok(doc) => doc,
            Err(e) => {
                return DocumentReadOutcome::Malformed {
                    detail: e.to_string(),
                }
            }
        };

        if let Err(e) = self.schemas.validate(schema_key, &doc.value) {
            return DocumentReadOutcome::Malformed {
                detail: e.to_string(),
            };
        }

        DocumentReadOutcome::Loaded(doc)
    }

    /// Read-modify-write one config file
    ///
    /// Contract: a backup of the pre-mutation content is taken before any
    /// write touches the target; the mutated value is validated against
    /// the named schema before persisting; on validation failure the write
    /// is aborted and the original file is untouched; unknown fields in
    /// the original document survive the round-trip.
    pub fn write_document<F>(&self, path: &Path, schema_key: &str, mutate: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Value) -> ConfigResult<()>,
    {
        let mut doc = match self.read_document(path, schema_key) {
            DocumentReadOutcome::Loaded(doc) => doc,
            DocumentReadOutcome::NotFound => {
                ConfigDocument::empty(DocumentFormat::from_path(path))
            }
            DocumentReadOutcome::Malformed { detail } => {
                return Err(ConfigError::ValidationFailed {
                    schema: schema_key.to_string(),
                    detail: format!("refusing to modify malformed file: {detail}"),
                })
            }
        };

        create_backup(path, &self.backup_dir)?;

        mutate(&mut doc.value)?;

        self.schemas.validate(schema_key, &doc.value)?;
        let content = doc.serialize()?;
        write_atomic(path, &content)?;

        // Post-write re-validation catches serializer drift early
        match self.read_document(path, schema_key) {
            DocumentReadOutcome::Loaded(_) => Ok(()),
            DocumentReadOutcome::NotFound => Err(ConfigError::Internal(format!(
                "file vanished after write: {}",
                path.display()
            ))),
            DocumentReadOutcome::Malformed { detail } => Err(ConfigError::Internal(format!(
                "written file failed re-validation: {detail}"
            ))),
        }
    }

    /// Read tools of one kind across all four scopes of the adapter
    ///
    /// A failure reading one scope logs a warning and contributes nothing;
    /// results from the other scopes are still returned.
    pub fn read_all_tools(
        &self,
        adapter: &dyn PlatformAdapter,
        kind: ToolKind,
    ) -> Vec<NormalizedTool> {
        let mut tools = Vec::new();
        for &scope in ToolScope::all() {
            match adapter.read_tools(self, kind, scope) {
                Ok(scoped) => tools.extend(scoped),
                Err(e) => {
                    warn!(
                        platform = adapter.display_name(),
                        %scope,
                        %kind,
                        error = %e,
                        "failed to read tools for scope"
                    );
                }
            }
        }
        tools
    }

    /// Read tools of one kind for a single scope
    pub fn read_tools_by_scope(
        &self,
        adapter: &dyn PlatformAdapter,
        kind: ToolKind,
        scope: ToolScope,
    ) -> ConfigResult<Vec<NormalizedTool>> {
        adapter.read_tools(self, kind, scope)
    }

    /// Read the complete inventory: every kind, every scope
    pub fn read_inventory(&self, adapter: &dyn PlatformAdapter) -> Vec<NormalizedTool> {
        let mut tools = Vec::new();
        for &kind in ToolKind::all() {
            tools.extend(self.read_all_tools(adapter, kind));
        }
        tools
    }
}
