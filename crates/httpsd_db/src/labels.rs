//! Label operations: key/value interning and pair resolution.
//!
//! Label keys and values are interned strings, unique and reused across
//! labels. A label is the pairing of one key and one value; the resolver
//! keeps pairs unique by looking up before creating, since the schema
//! does not enforce it.

use crate::error::{DbError, Result};
use crate::SdDb;
use httpsd_protocol::{Label, LabelKey, LabelValue};
use sqlx::Row;

impl SdDb {
    // ========================================================================
    // Label Key Operations
    // ========================================================================

    /// Whether a label key with the given value exists.
    pub async fn label_key_exists(&self, value: &str) -> Result<bool> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(false);
        }
        let row = sqlx::query("SELECT 1 FROM sd_label_keys WHERE value = ?")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Get a label key by its value.
    pub async fn label_key_find_by_value(&self, value: &str) -> Result<Option<LabelKey>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query("SELECT id, value FROM sd_label_keys WHERE value = ?")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| LabelKey {
            id: row.get("id"),
            value: row.get("value"),
        }))
    }

    /// Create a new label key. Trims the value; blank is rejected.
    pub async fn label_key_create(&self, value: &str) -> Result<LabelKey> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DbError::invalid_argument("label key cannot be blank"));
        }

        let result = sqlx::query("INSERT INTO sd_label_keys (value, created_at) VALUES (?, ?)")
            .bind(value)
            .bind(Self::now_millis())
            .execute(&self.pool)
            .await?;

        Ok(LabelKey {
            id: result.last_insert_rowid(),
            value: value.to_string(),
        })
    }

    /// Get the label key with this value, creating it on first use.
    pub async fn label_key_resolve(&self, value: &str) -> Result<LabelKey> {
        if let Some(key) = self.label_key_find_by_value(value).await? {
            return Ok(key);
        }
        self.label_key_create(value).await
    }

    /// List all label keys.
    pub async fn label_key_list_all(&self) -> Result<Vec<LabelKey>> {
        let rows = sqlx::query("SELECT id, value FROM sd_label_keys ORDER BY value")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| LabelKey {
                id: row.get("id"),
                value: row.get("value"),
            })
            .collect())
    }

    // ========================================================================
    // Label Value Operations
    // ========================================================================

    /// Whether a label value with the given value exists.
    pub async fn label_value_exists(&self, value: &str) -> Result<bool> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(false);
        }
        let row = sqlx::query("SELECT 1 FROM sd_label_values WHERE value = ?")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Get a label value by its value.
    pub async fn label_value_find_by_value(&self, value: &str) -> Result<Option<LabelValue>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query("SELECT id, value FROM sd_label_values WHERE value = ?")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| LabelValue {
            id: row.get("id"),
            value: row.get("value"),
        }))
    }

    /// Create a new label value. Trims the value; blank is rejected.
    pub async fn label_value_create(&self, value: &str) -> Result<LabelValue> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DbError::invalid_argument("label value cannot be blank"));
        }

        let result = sqlx::query("INSERT INTO sd_label_values (value, created_at) VALUES (?, ?)")
            .bind(value)
            .bind(Self::now_millis())
            .execute(&self.pool)
            .await?;

        Ok(LabelValue {
            id: result.last_insert_rowid(),
            value: value.to_string(),
        })
    }

    /// Get the label value with this value, creating it on first use.
    pub async fn label_value_resolve(&self, value: &str) -> Result<LabelValue> {
        if let Some(val) = self.label_value_find_by_value(value).await? {
            return Ok(val);
        }
        self.label_value_create(value).await
    }

    // ========================================================================
    // Label Operations
    // ========================================================================

    /// Get a label by its id. Negative ids resolve to `None`.
    pub async fn label_find_by_id(&self, id: i64) -> Result<Option<Label>> {
        if id < 0 {
            return Ok(None);
        }
        let row = sqlx::query(
            r#"
            SELECT l.id, k.id AS key_id, k.value AS key_value,
                   v.id AS value_id, v.value AS value_value
            FROM sd_labels l
            JOIN sd_label_keys k ON k.id = l.label_key_id
            JOIN sd_label_values v ON v.id = l.label_value_id
            WHERE l.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Self::row_to_label(&row)))
    }

    /// Get the stored label for a (key, value) pair, if one exists.
    pub async fn label_find_by_pair(
        &self,
        key: &LabelKey,
        value: &LabelValue,
    ) -> Result<Option<Label>> {
        let row = sqlx::query(
            r#"
            SELECT l.id, k.id AS key_id, k.value AS key_value,
                   v.id AS value_id, v.value AS value_value
            FROM sd_labels l
            JOIN sd_label_keys k ON k.id = l.label_key_id
            JOIN sd_label_values v ON v.id = l.label_value_id
            WHERE l.label_key_id = ? AND l.label_value_id = ?
            ORDER BY l.id
            LIMIT 1
            "#,
        )
        .bind(key.id)
        .bind(value.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Self::row_to_label(&row)))
    }

    /// Distinct label values ever paired with the given key, across all
    /// labels. Used to narrow value choices once a key is chosen; it is a
    /// hint, not a constraint on what may be saved.
    pub async fn label_values_for_key(&self, key: &LabelKey) -> Result<Vec<LabelValue>> {
        if key.value.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT v.id, v.value
            FROM sd_labels l
            JOIN sd_label_values v ON v.id = l.label_value_id
            WHERE l.label_key_id = ?
            ORDER BY v.value
            "#,
        )
        .bind(key.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| LabelValue {
                id: row.get("id"),
                value: row.get("value"),
            })
            .collect())
    }

    /// Resolve a (key, value) pair to a label: the stored one if present,
    /// else a new unsaved label referencing both. No write happens here.
    pub async fn label_resolve(&self, key: &LabelKey, value: &LabelValue) -> Result<Label> {
        if let Some(label) = self.label_find_by_pair(key, value).await? {
            return Ok(label);
        }
        Ok(Label {
            id: None,
            key: key.clone(),
            value: value.clone(),
        })
    }

    /// Commit a label to storage.
    ///
    /// A new label (no id) is inserted. A label loaded from storage whose
    /// key/value have since been changed by the caller is NOT mutated in
    /// place: a brand-new row with fresh identity is inserted and the
    /// original left untouched, since other records may reference it. An
    /// unchanged label is returned as-is with no write.
    pub async fn label_commit(&self, label: &Label) -> Result<Label> {
        let Some(id) = label.id else {
            return self.label_insert(&label.key, &label.value).await;
        };

        match self.label_find_by_id(id).await? {
            Some(stored) if stored.same_pair(label) => Ok(stored),
            // Changed or vanished: persist under a fresh identity.
            _ => self.label_insert(&label.key, &label.value).await,
        }
    }

    async fn label_insert(&self, key: &LabelKey, value: &LabelValue) -> Result<Label> {
        let result = sqlx::query(
            "INSERT INTO sd_labels (label_key_id, label_value_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(key.id)
        .bind(value.id)
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(Label {
            id: Some(result.last_insert_rowid()),
            key: key.clone(),
            value: value.clone(),
        })
    }

    pub(crate) fn row_to_label(row: &sqlx::sqlite::SqliteRow) -> Label {
        Label {
            id: Some(row.get("id")),
            key: LabelKey {
                id: row.get("key_id"),
                value: row.get("key_value"),
            },
            value: LabelValue {
                id: row.get("value_id"),
                value: row.get("value_value"),
            },
        }
    }
}
