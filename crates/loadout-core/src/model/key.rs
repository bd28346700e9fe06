//! Canonical key derivation and name validation

use crate::error::ConfigError;

use super::scope::ToolScope;
use super::tool::ToolKind;

/// Produce the stable identity string for a tool
///
/// The key is deterministic and format-independent: it never incorporates
/// file paths or disable encodings, only the logical identity.
#[must_use]
pub fn canonical_key(kind: ToolKind, scope: ToolScope, identity: &str) -> String {
    format!("{}:{}:{}", kind.as_str(), scope, identity)
}

/// Validate a tool name for use in canonical keys and file paths
///
/// Names must not be empty, contain path separators, `..`, null bytes, or
/// characters that are unsafe on common filesystems, must not start or end
/// with whitespace, and are capped at 128 characters.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidName("name cannot be empty".into()));
    }
    if name.len() > 128 {
        return Err(ConfigError::InvalidName(
            "name cannot exceed 128 characters".into(),
        ));
    }
    if name != name.trim() {
        return Err(ConfigError::InvalidName(
            "name cannot start or end with whitespace".into(),
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ConfigError::InvalidName(
            "name cannot contain path separators".into(),
        ));
    }
    if name.contains("..") {
        return Err(ConfigError::InvalidName(
            "name cannot contain '..'".into(),
        ));
    }
    if name.contains('\0') {
        return Err(ConfigError::InvalidName(
            "name cannot contain null bytes".into(),
        ));
    }
    if name
        .chars()
        .any(|c| matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
    {
        return Err(ConfigError::InvalidName(
            "name contains invalid characters (:*?\"<>|)".into(),
        ));
    }
    Ok(())
}
