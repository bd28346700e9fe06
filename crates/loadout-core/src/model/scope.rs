//! Tool scope handling
//!
//! Defines the hierarchy of scopes where a tool's configuration can live.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Where a tool's configuration physically lives and who controls it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolScope {
    /// User-global scope, per machine/account
    User,
    /// Project scope, checked into a workspace
    Project,
    /// Workspace-local scope, not shared
    Local,
    /// Organization-managed scope, read-only to the end user
    Managed,
}

impl ToolScope {
    /// Whether tools in this scope can be modified
    #[must_use]
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::Managed)
    }

    /// Precedence order for conflict/merge decisions (higher wins)
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Managed => 4,
            Self::Local => 3,
            Self::Project => 2,
            Self::User => 1,
        }
    }

    /// All scopes, in read order
    #[must_use]
    pub fn all() -> &'static [ToolScope] {
        &[Self::User, Self::Project, Self::Local, Self::Managed]
    }

    /// Scopes the engine is allowed to mutate
    #[must_use]
    pub fn writable_scopes() -> &'static [ToolScope] {
        &[Self::User, Self::Project, Self::Local]
    }
}

impl fmt::Display for ToolScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Project => write!(f, "project"),
            Self::Local => write!(f, "local"),
            Self::Managed => write!(f, "managed"),
        }
    }
}

impl FromStr for ToolScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "global" => Ok(Self::User),
            "project" => Ok(Self::Project),
            "local" => Ok(Self::Local),
            "managed" => Ok(Self::Managed),
            _ => Err(ConfigError::InvalidName(format!("invalid scope: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_precedence() {
        assert!(ToolScope::Managed.precedence() > ToolScope::Local.precedence());
        assert!(ToolScope::Local.precedence() > ToolScope::Project.precedence());
        assert!(ToolScope::Project.precedence() > ToolScope::User.precedence());
    }

    #[test]
    fn test_scope_writable() {
        assert!(ToolScope::User.is_writable());
        assert!(ToolScope::Project.is_writable());
        assert!(ToolScope::Local.is_writable());
        assert!(!ToolScope::Managed.is_writable());
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!(ToolScope::from_str("user").unwrap(), ToolScope::User);
        assert_eq!(ToolScope::from_str("global").unwrap(), ToolScope::User);
        assert_eq!(ToolScope::from_str("Managed").unwrap(), ToolScope::Managed);
        assert!(ToolScope::from_str("invalid").is_err());
    }

    #[test]
    fn test_writable_scopes_exclude_managed() {
        assert!(!ToolScope::writable_scopes().contains(&ToolScope::Managed));
    }
}
