//! Config file reading and writing
//!
//! The config service is the only component allowed to mutate a config
//! file on disk.

pub mod backup;
pub mod document;
pub mod service;

pub use document::{ConfigDocument, DocumentFormat};
pub use service::{ConfigService, DocumentReadOutcome};
