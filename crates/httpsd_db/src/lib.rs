//! Entity store for the httpsd discovery service.
//!
//! A single SQLite database holds the whole relational model: files,
//! targets, interned label keys/values, labels and records, plus the two
//! join tables binding records to their targets and labels. All access goes
//! through the typed methods on [`SdDb`]; no raw sqlx elsewhere.
//!
//! # Usage
//!
//! ```rust,ignore
//! use httpsd_db::{SdDb, Result};
//!
//! let db = SdDb::open("~/.httpsd/httpsd.sqlite3").await?;
//!
//! let file = db.file_create("node-targets").await?;
//! let records = db.records_for_file("node-targets").await?;
//! ```

mod error;
mod schema;

// Method implementations organized by domain
mod files;
mod labels;
mod records;
mod targets;

pub use error::{DbError, Result};

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// The entity store. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct SdDb {
    pool: SqlitePool,
}

impl SdDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };

        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open an existing database (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::not_found(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let url = format!("sqlite:{}?mode=rw", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool (escape hatch for complex queries).
    ///
    /// Prefer using the typed methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
