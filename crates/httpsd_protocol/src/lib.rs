//! Domain model for the httpsd service discovery server.
//!
//! Entities mirror what the store persists: files, targets, interned label
//! keys/values, labels (a key/value pairing) and records. This crate holds
//! the pure transformations only - no I/O, no async. The Entity Store lives
//! in `httpsd_db`, the HTTP surface in `httpsd_server`.

pub mod error;
pub mod static_config;
pub mod types;

pub use error::SdError;
pub use static_config::StaticConfig;
pub use types::{
    active_records, display_name, Label, LabelKey, LabelValue, Record, RecordStatus, SdFile,
    Target,
};
