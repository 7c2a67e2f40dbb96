//! Database schema creation for all httpsd tables.
//!
//! All CREATE TABLE statements live here - single source of truth.
//!
//! Natural keys (file names, target values, label key/value strings) are
//! unique at the schema level. The (key, value) pair of `sd_labels` is
//! deliberately NOT unique: pair dedupe is resolver behavior, and an edited
//! saved label is allowed to land as a duplicate pair row. Join tables use
//! their autoincrement id as insertion order.

use crate::error::Result;
use crate::SdDb;
use tracing::info;

impl SdDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        // Enable WAL mode for better concurrent access
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON")
            .execute(&self.pool)
            .await?;

        self.create_entity_tables().await?;
        self.create_record_tables().await?;

        info!("Database schema verified");
        Ok(())
    }

    /// Shared entities: files, targets, interned label keys/values, labels.
    async fn create_entity_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_targets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                value TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_label_keys (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                value TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_label_values (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                value TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_labels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label_key_id INTEGER NOT NULL REFERENCES sd_label_keys(id),
                label_value_id INTEGER NOT NULL REFERENCES sd_label_values(id),
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_labels_key ON sd_labels(label_key_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Records and their many-to-many bindings to targets and labels.
    async fn create_record_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE,
                file_id INTEGER REFERENCES sd_files(id),
                active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_record_targets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_id INTEGER NOT NULL REFERENCES sd_records(id) ON DELETE CASCADE,
                target_id INTEGER NOT NULL REFERENCES sd_targets(id),
                UNIQUE(record_id, target_id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS sd_record_labels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_id INTEGER NOT NULL REFERENCES sd_records(id) ON DELETE CASCADE,
                label_id INTEGER NOT NULL REFERENCES sd_labels(id),
                UNIQUE(record_id, label_id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_file ON sd_records(file_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_record_targets_record ON sd_record_targets(record_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_record_labels_record ON sd_record_labels(record_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
