//! File operations (logical discovery-document names).

use crate::error::{DbError, Result};
use crate::SdDb;
use httpsd_protocol::SdFile;
use sqlx::Row;

impl SdDb {
    /// Whether a file with the given name exists. Blank input is never an
    /// error here, just `false`.
    pub async fn file_exists(&self, file_name: &str) -> Result<bool> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Ok(false);
        }
        let row = sqlx::query("SELECT 1 FROM sd_files WHERE file_name = ?")
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Get a file by its name.
    pub async fn file_find_by_name(&self, file_name: &str) -> Result<Option<SdFile>> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query("SELECT id, file_name FROM sd_files WHERE file_name = ?")
            .bind(file_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| Self::row_to_file(&row)))
    }

    /// Create a new file. The name is trimmed; a blank name is rejected.
    /// Callers wanting dedupe must check `file_exists` first.
    pub async fn file_create(&self, file_name: &str) -> Result<SdFile> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(DbError::invalid_argument("file name cannot be blank"));
        }

        let result = sqlx::query("INSERT INTO sd_files (file_name, created_at) VALUES (?, ?)")
            .bind(file_name)
            .bind(Self::now_millis())
            .execute(&self.pool)
            .await?;

        Ok(SdFile {
            id: result.last_insert_rowid(),
            file_name: file_name.to_string(),
        })
    }

    /// List all files.
    pub async fn file_list_all(&self) -> Result<Vec<SdFile>> {
        let rows = sqlx::query("SELECT id, file_name FROM sd_files ORDER BY file_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Self::row_to_file).collect())
    }

    fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> SdFile {
        SdFile {
            id: row.get("id"),
            file_name: row.get("file_name"),
        }
    }
}
