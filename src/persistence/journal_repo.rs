//! Journal entry repository for `SQLite` persistence.

use std::sync::Arc;

use crate::models::journal::{Correction, JournalEntry, JournalStatus};
use crate::models::parse_timestamp;
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for journal entries.
#[derive(Clone)]
pub struct JournalRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct JournalRow {
    id: String,
    title: String,
    content: String,
    status: String,
    corrected_content: Option<String>,
    corrections: String,
    diff: Option<String>,
    created_at: String,
    updated_at: String,
}

impl JournalRow {
    fn into_entry(self) -> Result<JournalEntry> {
        let corrections: Vec<Correction> = serde_json::from_str(&self.corrections)?;
        Ok(JournalEntry {
            id: self.id,
            title: self.title,
            content: self.content,
            status: parse_status(&self.status)?,
            corrected_content: self.corrected_content,
            corrections,
            diff: self.diff,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

fn parse_status(s: &str) -> Result<JournalStatus> {
    match s {
        "draft" => Ok(JournalStatus::Draft),
        "corrected" => Ok(JournalStatus::Corrected),
        other => Err(AppError::Db(format!("invalid journal status: {other}"))),
    }
}

fn status_str(s: JournalStatus) -> &'static str {
    match s {
        JournalStatus::Draft => "draft",
        JournalStatus::Corrected => "corrected",
    }
}

impl JournalRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new journal entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, entry: &JournalEntry) -> Result<JournalEntry> {
        let corrections = serde_json::to_string(&entry.corrections)?;

        sqlx::query(
            "INSERT INTO journal_entry (id, title, content, status, corrected_content,
             corrections, diff, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&entry.id)
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(status_str(entry.status))
        .bind(&entry.corrected_content)
        .bind(&corrections)
        .bind(&entry.diff)
        .bind(entry.created_at.to_rfc3339())
        .bind(entry.updated_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(entry.clone())
    }

    /// Retrieve an entry by identifier.
    ///
    /// Returns `Ok(None)` if the entry does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<JournalEntry>> {
        let row: Option<JournalRow> = sqlx::query_as("SELECT * FROM journal_entry WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(JournalRow::into_entry).transpose()
    }

    /// List all entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<JournalEntry>> {
        let rows: Vec<JournalRow> =
            sqlx::query_as("SELECT * FROM journal_entry ORDER BY created_at DESC")
                .fetch_all(self.db.as_ref())
                .await?;

        rows.into_iter().map(JournalRow::into_entry).collect()
    }

    /// Overwrite every mutable column of an entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the entry does not exist.
    pub async fn update(&self, entry: &JournalEntry) -> Result<JournalEntry> {
        let corrections = serde_json::to_string(&entry.corrections)?;

        let result = sqlx::query(
            "UPDATE journal_entry SET title = ?1, content = ?2, status = ?3,
             corrected_content = ?4, corrections = ?5, diff = ?6, updated_at = ?7
             WHERE id = ?8",
        )
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(status_str(entry.status))
        .bind(&entry.corrected_content)
        .bind(&corrections)
        .bind(&entry.diff)
        .bind(entry.updated_at.to_rfc3339())
        .bind(&entry.id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "journal entry {} not found",
                entry.id
            )));
        }
        Ok(entry.clone())
    }

    /// Store a model correction, provided the entry still holds the content
    /// the correction was computed for.
    ///
    /// Returns `false` when no entry with that id and content exists.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn store_corrections(&self, entry: &JournalEntry) -> Result<bool> {
        let corrections = serde_json::to_string(&entry.corrections)?;

        let result = sqlx::query(
            "UPDATE journal_entry SET status = ?1, corrected_content = ?2, corrections = ?3,
             diff = ?4, updated_at = ?5
             WHERE id = ?6 AND content = ?7",
        )
        .bind(status_str(entry.status))
        .bind(&entry.corrected_content)
        .bind(&corrections)
        .bind(&entry.diff)
        .bind(entry.updated_at.to_rfc3339())
        .bind(&entry.id)
        .bind(&entry.content)
        .execute(self.db.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an entry.
    ///
    /// Returns `false` when no entry had the given identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM journal_entry WHERE id = ?1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
