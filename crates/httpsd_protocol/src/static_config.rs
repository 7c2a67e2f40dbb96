//! The Prometheus `http_sd_config` wire format.
//!
//! One discovery document is a JSON array of static configs:
//! `[{ "targets": ["host:port", ...], "labels": { "key": "value", ... } }]`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Record;

/// One entry of a discovery document: a record's targets and labels in the
/// shape Prometheus polls for.
///
/// An empty targets list and an empty labels map are serialized as-is,
/// never omitted - label-only entries stay meaningful for downstream joins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    pub targets: Vec<String>,
    /// Sorted by key so repeated generation is byte-identical.
    pub labels: BTreeMap<String, String>,
}

impl StaticConfig {
    /// Project a record into an entry.
    ///
    /// Targets keep the record's own order. Labels collapse to a key->value
    /// map; should two labels ever share a key, the later one wins rather
    /// than failing generation.
    pub fn from_record(record: &Record) -> Self {
        let mut config = StaticConfig::default();
        for target in &record.targets {
            config.targets.push(target.value.clone());
        }
        for label in &record.labels {
            config
                .labels
                .insert(label.key.value.clone(), label.value.value.clone());
        }
        config
    }
}
