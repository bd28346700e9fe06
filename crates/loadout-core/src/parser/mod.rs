//! Pure, format-specific parsers and writers
//!
//! Adapters call into these transforms; nothing here touches the
//! filesystem.

pub mod codex;
pub mod frontmatter;
pub mod mcp;

pub use frontmatter::{parse_command_file, parse_skill_manifest, CommandFile, SkillManifest};
