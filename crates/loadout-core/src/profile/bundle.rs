//! Versioned profile export bundles and import analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::model::{ToolKind, ToolMetadata};

/// Discriminator value for exported bundles
pub const BUNDLE_TYPE: &str = "loadout-profile";
/// Current bundle format version
pub const BUNDLE_VERSION: u32 = 1;

/// A self-contained, shareable export of one profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileBundle {
    pub bundle_type: String,
    pub version: u32,
    pub profile: BundleProfile,
    pub tools: Vec<BundleTool>,
}

/// Profile header carried in a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleProfile {
    pub name: String,
    pub exported_at: DateTime<Utc>,
}

/// One exported tool: identity, desired state, and enough embedded config
/// to recreate it on another machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleTool {
    pub key: String,
    pub kind: ToolKind,
    pub enabled: bool,
    /// Serialized [`ToolMetadata`]: MCP entries carry command/args/env/url,
    /// skills and commands carry verbatim file contents, hooks carry
    /// event/matcher/definitions
    pub config: Value,
}

impl BundleTool {
    /// The embedded metadata, if it deserializes
    #[must_use]
    pub fn metadata(&self) -> Option<ToolMetadata> {
        serde_json::from_value(self.config.clone()).ok()
    }
}

/// How one bundle entry relates to the live inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportDisposition {
    /// An equivalent tool already exists
    Matching,
    /// A tool with the same identity exists but differs
    Conflicting,
    /// No tool with this identity exists
    Missing,
}

/// One analyzed bundle entry
#[derive(Debug, Clone)]
pub struct ImportItem {
    pub key: String,
    pub disposition: ImportDisposition,
}

/// Classification of every entry in a bundle against the live inventory
///
/// The engine never auto-resolves conflicts; the caller decides.
#[derive(Debug, Clone, Default)]
pub struct ImportAnalysis {
    pub items: Vec<ImportItem>,
}

impl ImportAnalysis {
    fn count(&self, disposition: ImportDisposition) -> usize {
        self.items
            .iter()
            .filter(|i| i.disposition == disposition)
            .count()
    }

    #[must_use]
    pub fn matching(&self) -> usize {
        self.count(ImportDisposition::Matching)
    }

    #[must_use]
    pub fn conflicting(&self) -> usize {
        self.count(ImportDisposition::Conflicting)
    }

    #[must_use]
    pub fn missing(&self) -> usize {
        self.count(ImportDisposition::Missing)
    }
}

/// Type-specific equivalence between an imported tool and a live one
///
/// Deliberately a heuristic: MCP compares command, args, and env key
/// count; hooks compare event, matcher, and definition count;
/// skills and commands compare a content hash.
#[must_use]
pub fn metadata_equivalent(imported: &ToolMetadata, live: &ToolMetadata) -> bool {
    match (imported, live) {
        (
            ToolMetadata::McpServer {
                command: c1,
                args: a1,
                env: e1,
                url: u1,
                ..
            },
            ToolMetadata::McpServer {
                command: c2,
                args: a2,
                env: e2,
                url: u2,
                ..
            },
        ) => c1 == c2 && a1 == a2 && u1 == u2 && e1.len() == e2.len(),
        (
            ToolMetadata::Hook {
                event: ev1,
                matcher: m1,
                definitions: d1,
                ..
            },
            ToolMetadata::Hook {
                event: ev2,
                matcher: m2,
                definitions: d2,
                ..
            },
        ) => ev1 == ev2 && m1 == m2 && d1.len() == d2.len(),
        (
            ToolMetadata::Skill {
                content: c1,
                files: f1,
                ..
            },
            ToolMetadata::Skill {
                content: c2,
                files: f2,
                ..
            },
        ) => content_hash(c1.as_deref()) == content_hash(c2.as_deref()) && f1 == f2,
        (
            ToolMetadata::Command { content: c1, .. },
            ToolMetadata::Command { content: c2, .. },
        ) => content_hash(c1.as_deref()) == content_hash(c2.as_deref()),
        _ => false,
    }
}

fn content_hash(content: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}
