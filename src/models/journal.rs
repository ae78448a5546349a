//! Journal entry and grammar correction models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a journal entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JournalStatus {
    /// Written or edited since the last correction pass.
    Draft,
    /// Corrections are current for the stored content.
    Corrected,
}

/// Classification of a single correction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionCategory {
    /// Agreement, tense, mood and other grammar errors.
    Grammar,
    /// Misspelled words.
    Spelling,
    /// Missing or misplaced written accents.
    Accent,
    /// Wrong or unnatural word choice.
    Vocabulary,
    /// Punctuation including inverted marks.
    Punctuation,
    /// Anything the model could not classify.
    Other,
}

impl CorrectionCategory {
    /// Map a free-form model label onto a known category.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "grammar" | "gramática" | "gramatica" => Self::Grammar,
            "spelling" | "ortografía" | "ortografia" => Self::Spelling,
            "accent" | "accents" | "acento" | "tilde" => Self::Accent,
            "vocabulary" | "word choice" | "vocabulario" => Self::Vocabulary,
            "punctuation" | "puntuación" | "puntuacion" => Self::Punctuation,
            _ => Self::Other,
        }
    }
}

/// One suggested fix within a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Correction {
    /// Fragment as the learner wrote it.
    pub original: String,
    /// Suggested replacement.
    pub corrected: String,
    /// Short explanation for the learner.
    pub explanation: String,
    /// Correction classification.
    pub category: CorrectionCategory,
}

/// A journal entry written by the learner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    /// Unique record identifier.
    pub id: String,
    /// Entry title.
    pub title: String,
    /// Entry text as written.
    pub content: String,
    /// Correction status.
    pub status: JournalStatus,
    /// Fully corrected text from the last correction pass.
    pub corrected_content: Option<String>,
    /// Individual corrections from the last correction pass.
    pub corrections: Vec<Correction>,
    /// Unified diff between `content` and `corrected_content`.
    pub diff: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Construct a new draft entry.
    #[must_use]
    pub fn new(title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            status: JournalStatus::Draft,
            corrected_content: None,
            corrections: Vec::new(),
            diff: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the content, discarding any corrections made for the old text.
    pub fn revise(&mut self, content: String) {
        if content != self.content {
            self.content = content;
            self.status = JournalStatus::Draft;
            self.corrected_content = None;
            self.corrections.clear();
            self.diff = None;
        }
        self.updated_at = Utc::now();
    }
}
