//! Profiles: named snapshots of desired tool states

pub mod bundle;
pub mod engine;
pub mod store;
pub mod types;

pub use bundle::{
    BundleProfile, BundleTool, ImportAnalysis, ImportDisposition, ImportItem, ProfileBundle,
};
pub use engine::ProfileEngine;
pub use store::{JsonFileStore, KvStore};
pub use types::{Profile, ProfileStore, ProfileToolEntry, ReconcileReport, SwitchReport};
