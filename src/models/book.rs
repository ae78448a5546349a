//! E-book and reading progress models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for an uploaded e-book file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    /// Unique record identifier; also names the stored file.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Optional author name.
    pub author: Option<String>,
    /// File name supplied at upload time.
    pub file_name: String,
    /// Size of the stored file in bytes.
    pub file_size: i64,
    /// Hex-encoded SHA-256 digest of the file contents.
    pub sha256: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Construct a new book record.
    #[must_use]
    pub fn new(
        title: String,
        author: Option<String>,
        file_name: String,
        file_size: i64,
        sha256: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            author,
            file_name,
            file_size,
            sha256,
            created_at: Utc::now(),
        }
    }
}

/// Where the learner stopped reading a book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingProgress {
    /// Book identifier.
    pub book_id: String,
    /// Reader-specific location token (typically an EPUB CFI).
    pub location: Option<String>,
    /// Percentage read, 0 to 100.
    pub percentage: f64,
    /// Last save timestamp; `None` when progress was never saved.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReadingProgress {
    /// Progress reported for a book that has never been opened.
    #[must_use]
    pub fn unread(book_id: String) -> Self {
        Self {
            book_id,
            location: None,
            percentage: 0.0,
            updated_at: None,
        }
    }
}
