//! Discovery document generation.
//!
//! Turns the records bound to a file into the JSON array Prometheus polls.
//! Generation is read-only and stateless: concurrent requests share nothing
//! mutable, and repeated calls without intervening mutation produce
//! byte-identical output.

use httpsd_db::{DbError, SdDb};
use httpsd_protocol::{active_records, StaticConfig};
use thiserror::Error;

/// Errors a generation request can fail with. An unknown file name is NOT
/// among them: that degrades to an empty document so Prometheus can poll
/// files that have not been provisioned yet without alarming.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The requested file name was blank.
    #[error("file name cannot be blank")]
    UnprocessableInput,

    /// Storage fault; fatal for this request only, safe to retry.
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("failed to serialize discovery document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Generate the discovery document for a file name.
///
/// Selects the file's records, keeps the active ones, projects each into a
/// [`StaticConfig`] in storage order and serializes the lot to one JSON
/// array. Unknown file names yield `"[]"`.
pub async fn generate(db: &SdDb, file_name: &str) -> Result<String, DiscoveryError> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return Err(DiscoveryError::UnprocessableInput);
    }

    let mut configs: Vec<StaticConfig> = Vec::new();
    if db.file_exists(file_name).await? {
        let records = db.records_for_file(file_name).await?;
        for record in active_records(records) {
            configs.push(StaticConfig::from_record(&record));
        }
    }

    Ok(serde_json::to_string(&configs)?)
}
