//! Entity types shared across the workspace.
//!
//! Every persisted entity carries a surrogate id assigned by the store on
//! creation and never reused. An id of `None` means "not yet saved".
//! Natural keys (`file_name`, `value`) are unique per entity kind.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SdError;

/// A logical discovery-document name. Served as `GET /{file_name}.json`.
/// Stored without a file extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdFile {
    pub id: i64,
    /// Non-blank, globally unique, no extension.
    pub file_name: String,
}

/// One monitored endpoint, an arbitrary `host:port` or URL string.
/// Unique by value; shared by any number of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub value: String,
}

/// Interned label-key string. Unique by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelKey {
    pub id: i64,
    pub value: String,
}

/// Interned label-value string. Unique by value and reused across labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelValue {
    pub id: i64,
    pub value: String,
}

/// The pairing of exactly one [`LabelKey`] and one [`LabelValue`].
///
/// Identity is by assigned id, but two labels with the same (key, value)
/// pair are semantically identical; the resolver avoids creating duplicate
/// pairs. A label may be referenced by many records, so a saved label is
/// never mutated in place - see `label_commit` in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// `None` until the label is committed to the store.
    pub id: Option<i64>,
    pub key: LabelKey,
    pub value: LabelValue,
}

impl Label {
    /// Whether this label has been persisted yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Semantic identity: same interned key and value.
    pub fn same_pair(&self, other: &Label) -> bool {
        self.key.id == other.key.id && self.value.id == other.value.id
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key.value, self.value.value)
    }
}

/// Record status. Active records are included in generated documents;
/// disabled records are kept but excluded, so an operator can switch a
/// record off without deleting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Disabled,
}

impl RecordStatus {
    pub fn from_bool(active: bool) -> Self {
        if active {
            RecordStatus::Active
        } else {
            RecordStatus::Disabled
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, RecordStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The unit of configuration: a set of targets and labels bound to a file,
/// with an active/disabled flag.
///
/// `targets` and `labels` keep insertion order; the store persists that
/// order and the generator renders targets in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// `None` for an unsaved record.
    pub id: Option<i64>,
    /// Unique among records once non-blank.
    pub name: String,
    /// Owning file, if the record has been bound to one.
    pub file: Option<SdFile>,
    pub active: bool,
    pub targets: Vec<Target>,
    pub labels: Vec<Label>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            file: None,
            active: true,
            targets: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl Record {
    pub fn status(&self) -> RecordStatus {
        RecordStatus::from_bool(self.active)
    }

    /// Attach a label, enforcing at most one label per key.
    ///
    /// If the record already carries a label with the same key, that label
    /// is removed first - replace semantics, last write wins, no merge.
    /// Rejects labels whose key or value string is blank.
    pub fn assign_label(&mut self, label: Label) -> Result<(), SdError> {
        if label.key.value.trim().is_empty() {
            return Err(SdError::invalid_argument("label key cannot be blank"));
        }
        if label.value.value.trim().is_empty() {
            return Err(SdError::invalid_argument("label value cannot be blank"));
        }
        self.labels
            .retain(|existing| existing.key.value != label.key.value);
        self.labels.push(label);
        Ok(())
    }
}

/// Filter to the records whose status is active, keeping order. Disabled
/// records are excluded from generated documents.
pub fn active_records(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| record.status().is_active())
        .collect()
}

/// Human-readable record name, used wherever a record is shown or a blank
/// name needs a stable fallback before saving.
///
/// Absent record -> "New Record"; non-blank name -> the name; saved but
/// unnamed -> "Record #<id>"; otherwise "New Record".
pub fn display_name(record: Option<&Record>) -> String {
    let Some(record) = record else {
        return "New Record".to_string();
    };
    if !record.name.trim().is_empty() {
        return record.name.clone();
    }
    match record.id {
        Some(id) => format!("Record #{id}"),
        None => "New Record".to_string(),
    }
}
