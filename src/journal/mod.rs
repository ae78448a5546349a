//! Journal entries and model-driven grammar corrections.

pub mod corrector;

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::llm::{prompts, LlmClient};
use crate::models::journal::{JournalEntry, JournalStatus};
use crate::persistence::db::Database;
use crate::persistence::journal_repo::JournalRepo;
use crate::{AppError, Result};

/// Longest accepted journal title.
pub const MAX_TITLE_CHARS: usize = 200;

/// Journal operations over the journal repository and the language model.
#[derive(Clone)]
pub struct JournalService {
    repo: JournalRepo,
    llm: Arc<dyn LlmClient>,
    max_chars: usize,
}

impl JournalService {
    /// Create a service backed by `db` and `llm`.
    #[must_use]
    pub fn new(db: Arc<Database>, llm: Arc<dyn LlmClient>, max_chars: usize) -> Self {
        Self {
            repo: JournalRepo::new(db),
            llm,
            max_chars,
        }
    }

    fn validate_title(title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        Ok(title.to_owned())
    }

    fn validate_content(&self, content: &str) -> Result<String> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("content must not be empty".into()));
        }
        let chars = content.chars().count();
        if chars > self.max_chars {
            return Err(AppError::Validation(format!(
                "content is {chars} characters; the limit is {}",
                self.max_chars
            )));
        }
        Ok(content.to_owned())
    }

    /// List entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<JournalEntry>> {
        self.repo.list().await
    }

    /// Create a draft entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank title or blank/overlong content.
    pub async fn create(&self, title: &str, content: &str) -> Result<JournalEntry> {
        let title = Self::validate_title(title)?;
        let content = self.validate_content(content)?;
        let entry = self.repo.create(&JournalEntry::new(title, content)).await?;
        info!(entry_id = %entry.id, "journal entry created");
        Ok(entry)
    }

    /// Load one entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the entry does not exist.
    pub async fn get(&self, id: &str) -> Result<JournalEntry> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("journal entry {id} not found")))
    }

    /// Edit an entry. Changing the content returns it to draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the entry does not exist and
    /// `AppError::Validation` for invalid fields.
    pub async fn update(
        &self,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<JournalEntry> {
        let mut entry = self.get(id).await?;
        if let Some(title) = title {
            entry.title = Self::validate_title(title)?;
        }
        match content {
            Some(content) => entry.revise(self.validate_content(content)?),
            None => entry.updated_at = Utc::now(),
        }
        self.repo.update(&entry).await
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the entry does not exist.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(format!("journal entry {id} not found")));
        }
        info!(entry_id = %id, "journal entry deleted");
        Ok(())
    }

    /// Ask the model for corrections and store them on the entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the entry does not exist,
    /// `AppError::Llm` if the model call fails or returns unusable JSON, and
    /// `AppError::Validation` if the content was edited before the
    /// corrections could be stored.
    pub async fn correct(&self, id: &str) -> Result<JournalEntry> {
        let mut entry = self.get(id).await?;
        let raw = self
            .llm
            .complete(prompts::journal_corrections(&entry.title, &entry.content))
            .await?;
        let result = corrector::parse_corrections(&raw)?;
        let diff = corrector::unified_diff(&entry.content, &result.corrected_text);

        entry.corrections = result.corrections;
        entry.corrected_content = Some(result.corrected_text);
        entry.diff = diff;
        entry.status = JournalStatus::Corrected;
        entry.updated_at = Utc::now();

        if !self.repo.store_corrections(&entry).await? {
            // Deleted or edited while the model was working.
            self.get(id).await?;
            return Err(AppError::Validation(format!(
                "journal entry {id} changed while corrections were generated; request them again"
            )));
        }
        let entry = self.get(id).await?;
        info!(
            entry_id = %entry.id,
            corrections = entry.corrections.len(),
            "journal entry corrected"
        );
        Ok(entry)
    }
}
