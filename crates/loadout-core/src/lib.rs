//! Loadout core - tool normalization and profile reconciliation
//!
//! This crate normalizes the tools (skills, MCP servers, hooks, commands)
//! that AI coding-agent platforms load from on-disk configuration into one
//! canonical model, performs schema-checked, backed-up mutations of those
//! files, and reconciles the live environment against named profiles.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::single_match_else,
    clippy::match_same_arms,
    clippy::unnecessary_debug_formatting,
    clippy::ref_option,
    clippy::option_if_let_else,
    clippy::needless_pass_by_value,
    clippy::map_unwrap_or,
    clippy::manual_let_else,
    clippy::unnecessary_wraps,
    clippy::unused_self,
    clippy::missing_panics_doc
)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod parser;
pub mod profile;
pub mod schema;
pub mod watch;

pub use adapter::{AdapterEnv, AdapterRegistry, PlatformAdapter, PlatformId};
pub use config::{ConfigService, DocumentReadOutcome};
pub use error::{ConfigError, ConfigResult};
pub use manager::{ActionResult, ToolManager};
pub use model::{NormalizedTool, ToolKind, ToolScope, ToolStatus};
pub use profile::{Profile, ProfileEngine, ProfileStore, SwitchReport};
