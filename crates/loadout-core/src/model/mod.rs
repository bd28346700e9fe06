//! Canonical tool model shared by all platforms

pub mod key;
pub mod metadata;
pub mod scope;
pub mod tool;

pub use key::{canonical_key, validate_name};
pub use metadata::{HookDefinition, McpTransport, ToolMetadata};
pub use scope::ToolScope;
pub use tool::{NormalizedTool, ToolKind, ToolSource, ToolStatus};
