//! Record operations: the unit of configuration binding targets and labels
//! to a file.
//!
//! Record-target and record-label bindings live in join tables whose
//! autoincrement id preserves insertion order; loads read them back in that
//! order, so the generator renders targets exactly as they were attached.

use crate::error::{DbError, Result};
use crate::SdDb;
use httpsd_protocol::{Label, Record, SdFile, Target};
use sqlx::Row;

impl SdDb {
    /// Whether a record with this name exists.
    pub async fn record_exists_by_name(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        let row = sqlx::query("SELECT 1 FROM sd_records WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Get a record by its name, associations loaded.
    pub async fn record_find_by_name(&self, name: &str) -> Result<Option<Record>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query(
            r#"
            SELECT r.id, r.name, r.active, f.id AS file_id, f.file_name
            FROM sd_records r
            LEFT JOIN sd_files f ON f.id = r.file_id
            WHERE r.name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_record(&row).await?)),
            None => Ok(None),
        }
    }

    /// Get a record by its id. Negative ids resolve to `None`.
    pub async fn record_find_by_id(&self, id: i64) -> Result<Option<Record>> {
        if id < 0 {
            return Ok(None);
        }
        let row = sqlx::query(
            r#"
            SELECT r.id, r.name, r.active, f.id AS file_id, f.file_name
            FROM sd_records r
            LEFT JOIN sd_files f ON f.id = r.file_id
            WHERE r.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_record(&row).await?)),
            None => Ok(None),
        }
    }

    /// List all records in storage order.
    pub async fn record_list_all(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.active, f.id AS file_id, f.file_name
            FROM sd_records r
            LEFT JOIN sd_files f ON f.id = r.file_id
            ORDER BY r.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(self.hydrate_record(row).await?);
        }
        Ok(records)
    }

    /// All records bound to the file with the given (trimmed) name, in
    /// storage order. Blank or unknown names yield an empty list.
    pub async fn records_for_file(&self, file_name: &str) -> Result<Vec<Record>> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.active, f.id AS file_id, f.file_name
            FROM sd_records r
            JOIN sd_files f ON f.id = r.file_id
            WHERE f.file_name = ?
            ORDER BY r.id
            "#,
        )
        .bind(file_name)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(self.hydrate_record(row).await?);
        }
        Ok(records)
    }

    /// Insert or update a record together with its target and label
    /// bindings, transactionally. Join rows are rewritten in the order the
    /// record carries them.
    ///
    /// Labels must already be committed (have ids); uncommitted labels are
    /// rejected rather than silently persisted.
    pub async fn record_save(&self, record: &Record) -> Result<Record> {
        for label in &record.labels {
            if label.id.is_none() {
                return Err(DbError::invalid_argument(
                    "record labels must be committed before saving",
                ));
            }
        }

        let name = record.name.trim();
        let stored_name = if name.is_empty() { None } else { Some(name) };
        let file_id = record.file.as_ref().map(|file| file.id);
        let now = Self::now_millis();

        let mut tx = self.pool.begin().await?;

        let record_id = match record.id {
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE sd_records SET name = ?, file_id = ?, active = ?, updated_at = ? WHERE id = ?",
                )
                .bind(stored_name)
                .bind(file_id)
                .bind(record.active)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(DbError::not_found(format!("record {id} does not exist")));
                }
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO sd_records (name, file_id, active, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(stored_name)
                .bind(file_id)
                .bind(record.active)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                result.last_insert_rowid()
            }
        };

        sqlx::query("DELETE FROM sd_record_targets WHERE record_id = ?")
            .bind(record_id)
            .execute(&mut *tx)
            .await?;
        for target in &record.targets {
            sqlx::query("INSERT INTO sd_record_targets (record_id, target_id) VALUES (?, ?)")
                .bind(record_id)
                .bind(target.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM sd_record_labels WHERE record_id = ?")
            .bind(record_id)
            .execute(&mut *tx)
            .await?;
        for label in &record.labels {
            sqlx::query("INSERT INTO sd_record_labels (record_id, label_id) VALUES (?, ?)")
                .bind(record_id)
                .bind(label.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = record.clone();
        saved.id = Some(record_id);
        saved.name = stored_name.unwrap_or_default().to_string();
        Ok(saved)
    }

    /// Delete a record and its bindings. Targets, labels and interned
    /// strings the record referenced stay behind for reuse.
    pub async fn record_delete(&self, id: i64) -> Result<()> {
        if id < 0 {
            return Err(DbError::invalid_argument("record id cannot be negative"));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sd_record_targets WHERE record_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sd_record_labels WHERE record_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sd_records WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Attach targets and labels to a record row, in join insertion order.
    async fn hydrate_record(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Record> {
        let record_id: i64 = row.get("id");
        let name: Option<String> = row.get("name");
        let file = match row.get::<Option<i64>, _>("file_id") {
            Some(file_id) => Some(SdFile {
                id: file_id,
                file_name: row.get("file_name"),
            }),
            None => None,
        };

        Ok(Record {
            id: Some(record_id),
            name: name.unwrap_or_default(),
            file,
            active: row.get("active"),
            targets: self.load_record_targets(record_id).await?,
            labels: self.load_record_labels(record_id).await?,
        })
    }

    async fn load_record_targets(&self, record_id: i64) -> Result<Vec<Target>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.value
            FROM sd_record_targets rt
            JOIN sd_targets t ON t.id = rt.target_id
            WHERE rt.record_id = ?
            ORDER BY rt.id
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Target {
                id: row.get("id"),
                value: row.get("value"),
            })
            .collect())
    }

    async fn load_record_labels(&self, record_id: i64) -> Result<Vec<Label>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, k.id AS key_id, k.value AS key_value,
                   v.id AS value_id, v.value AS value_value
            FROM sd_record_labels rl
            JOIN sd_labels l ON l.id = rl.label_id
            JOIN sd_label_keys k ON k.id = l.label_key_id
            JOIN sd_label_values v ON v.id = l.label_value_id
            WHERE rl.record_id = ?
            ORDER BY rl.id
            "#,
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_label).collect())
    }
}
