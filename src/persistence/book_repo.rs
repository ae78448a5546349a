//! Book and reading progress repository for `SQLite` persistence.

use std::sync::Arc;

use crate::models::book::{Book, ReadingProgress};
use crate::models::parse_timestamp;
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for books and reading progress.
#[derive(Clone)]
pub struct BookRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct BookRow {
    id: String,
    title: String,
    author: Option<String>,
    file_name: String,
    file_size: i64,
    sha256: String,
    created_at: String,
}

impl BookRow {
    fn into_book(self) -> Result<Book> {
        Ok(Book {
            id: self.id,
            title: self.title,
            author: self.author,
            file_name: self.file_name,
            file_size: self.file_size,
            sha256: self.sha256,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    book_id: String,
    location: Option<String>,
    percentage: f64,
    updated_at: String,
}

impl ProgressRow {
    fn into_progress(self) -> Result<ReadingProgress> {
        Ok(ReadingProgress {
            book_id: self.book_id,
            location: self.location,
            percentage: self.percentage,
            updated_at: Some(parse_timestamp("updated_at", &self.updated_at)?),
        })
    }
}

impl BookRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new book record.
    ///
    /// Returns `None` when a book with the same digest is already stored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails for any other reason.
    pub async fn create(&self, book: &Book) -> Result<Option<Book>> {
        let insert = sqlx::query(
            "INSERT INTO book (id, title, author, file_name, file_size, sha256, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.file_name)
        .bind(book.file_size)
        .bind(&book.sha256)
        .bind(book.created_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await;

        match insert {
            Ok(_) => Ok(Some(book.clone())),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Retrieve a book by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as("SELECT * FROM book WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(BookRow::into_book).transpose()
    }

    /// Retrieve a book by the SHA-256 digest of its file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_sha256(&self, sha256: &str) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as("SELECT * FROM book WHERE sha256 = ?1")
            .bind(sha256)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(BookRow::into_book).transpose()
    }

    /// List all books ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> =
            sqlx::query_as("SELECT * FROM book ORDER BY title COLLATE NOCASE, created_at")
                .fetch_all(self.db.as_ref())
                .await?;

        rows.into_iter().map(BookRow::into_book).collect()
    }

    /// Delete a book; its reading progress is removed by cascade.
    ///
    /// Returns `false` when no book had the given identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Retrieve saved reading progress for a book.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_progress(&self, book_id: &str) -> Result<Option<ReadingProgress>> {
        let row: Option<ProgressRow> =
            sqlx::query_as("SELECT * FROM reading_progress WHERE book_id = ?1")
                .bind(book_id)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(ProgressRow::into_progress).transpose()
    }

    /// Insert or replace reading progress for a book.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the upsert fails.
    pub async fn save_progress(&self, progress: &ReadingProgress) -> Result<ReadingProgress> {
        let updated_at = progress
            .updated_at
            .ok_or_else(|| AppError::Db("reading progress requires updated_at".into()))?;

        sqlx::query(
            "INSERT INTO reading_progress (book_id, location, percentage, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(book_id) DO UPDATE SET
                 location = excluded.location,
                 percentage = excluded.percentage,
                 updated_at = excluded.updated_at",
        )
        .bind(&progress.book_id)
        .bind(&progress.location)
        .bind(progress.percentage)
        .bind(updated_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(progress.clone())
    }
}
