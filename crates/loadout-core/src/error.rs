//! Error types for core operations

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ToolScope;

/// Result type for core operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during config and profile operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no such concept for this scope
    #[error("{platform} has no {operation} for {scope} scope")]
    ScopeNotSupported {
        platform: String,
        scope: ToolScope,
        operation: &'static str,
    },

    /// Cannot modify managed scope
    #[error("Cannot modify managed scope (read-only)")]
    ManagedScope,

    /// Tool not found
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },

    /// Profile not found
    #[error("Profile '{id}' not found")]
    ProfileNotFound { id: String },

    /// Schema validation failed - the write was aborted
    #[error("Validation against schema '{schema}' failed: {detail}")]
    ValidationFailed { schema: String, detail: String },

    /// File I/O error
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// JSON parse error
    #[error("JSON parse error in {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    /// TOML parse error
    #[error("TOML parse error in {path}: {message}")]
    TomlParse { path: PathBuf, message: String },

    /// YAML frontmatter parse error
    #[error("Frontmatter parse error in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    /// Backup creation failed
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),

    /// Persisted store contained invalid data
    #[error("Store corrupt: {0}")]
    StoreCorrupt(String),

    /// More than one platform detected - caller must disambiguate
    #[error("Multiple platforms detected: {0:?}. Specify one explicitly")]
    AmbiguousPlatform(Vec<String>),

    /// No platform detected
    #[error("No supported platform detected")]
    NoPlatform,

    /// Invalid tool or profile name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Unsupported bundle format version
    #[error("Unsupported bundle version: {0}")]
    UnsupportedBundleVersion(u32),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConfigError {
    /// Error code for CLI/host responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ScopeNotSupported { .. } => "SCOPE_NOT_SUPPORTED",
            Self::ManagedScope => "PERMISSION_DENIED",
            Self::ToolNotFound { .. } => "TOOL_NOT_FOUND",
            Self::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            Self::ValidationFailed { .. } => "VALIDATION_FAILED",
            Self::Io { .. } => "IO_ERROR",
            Self::JsonParse { .. } | Self::TomlParse { .. } | Self::Frontmatter { .. } => {
                "PARSE_ERROR"
            }
            Self::BackupFailed(_) => "BACKUP_FAILED",
            Self::StoreCorrupt(_) => "STORE_CORRUPT",
            Self::AmbiguousPlatform(_) => "AMBIGUOUS_PLATFORM",
            Self::NoPlatform => "NO_PLATFORM",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::UnsupportedBundleVersion(_) => "UNSUPPORTED_VERSION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Build an I/O error carrying the offending path
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ConfigError::ManagedScope;
        assert_eq!(err.code(), "PERMISSION_DENIED");

        let err = ConfigError::ScopeNotSupported {
            platform: "codex".into(),
            scope: ToolScope::Project,
            operation: "skills directory",
        };
        assert_eq!(err.code(), "SCOPE_NOT_SUPPORTED");
        assert!(err.to_string().contains("codex"));
        assert!(err.to_string().contains("project"));
    }
}
