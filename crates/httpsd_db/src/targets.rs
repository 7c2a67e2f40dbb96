//! Target operations (scrape endpoint strings).

use crate::error::{DbError, Result};
use crate::SdDb;
use httpsd_protocol::Target;
use sqlx::Row;

impl SdDb {
    /// Whether a target with the given value exists.
    pub async fn target_exists(&self, value: &str) -> Result<bool> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(false);
        }
        let row = sqlx::query("SELECT 1 FROM sd_targets WHERE value = ?")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Get a target by its value.
    pub async fn target_find_by_value(&self, value: &str) -> Result<Option<Target>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query("SELECT id, value FROM sd_targets WHERE value = ?")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| Self::row_to_target(&row)))
    }

    /// Create a new target. Trims the value; blank is rejected.
    pub async fn target_create(&self, value: &str) -> Result<Target> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DbError::invalid_argument("target value cannot be blank"));
        }

        let result = sqlx::query("INSERT INTO sd_targets (value, created_at) VALUES (?, ?)")
            .bind(value)
            .bind(Self::now_millis())
            .execute(&self.pool)
            .await?;

        Ok(Target {
            id: result.last_insert_rowid(),
            value: value.to_string(),
        })
    }

    /// Get the target with this value, creating it on first use.
    pub async fn target_resolve(&self, value: &str) -> Result<Target> {
        if let Some(target) = self.target_find_by_value(value).await? {
            return Ok(target);
        }
        self.target_create(value).await
    }

    /// List all targets.
    pub async fn target_list_all(&self) -> Result<Vec<Target>> {
        let rows = sqlx::query("SELECT id, value FROM sd_targets ORDER BY value")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Self::row_to_target).collect())
    }

    fn row_to_target(row: &sqlx::sqlite::SqliteRow) -> Target {
        Target {
            id: row.get("id"),
            value: row.get("value"),
        }
    }
}
