//! E-book shelf: upload validation, file storage and reading progress.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{info, warn};

use crate::models::book::{Book, ReadingProgress};
use crate::persistence::book_repo::BookRepo;
use crate::persistence::db::Database;
use crate::{AppError, Result};

/// Leading bytes of every ZIP local file header; EPUB files are ZIP archives.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// MIME type served for downloads.
pub const EPUB_CONTENT_TYPE: &str = "application/epub+zip";

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Optional display title; defaults to the file stem.
    pub title: Option<String>,
    /// Optional author.
    pub author: Option<String>,
}

/// Outcome of an upload.
#[derive(Debug, Clone)]
pub struct Stored {
    /// The stored (or previously stored) book.
    pub book: Book,
    /// `false` when an identical file was already on the shelf.
    pub created: bool,
}

/// Book operations over the book repository and the upload directory.
#[derive(Clone)]
pub struct Library {
    repo: BookRepo,
    upload_dir: PathBuf,
    max_upload_bytes: u64,
}

impl Library {
    /// Create a library storing files under `upload_dir`.
    #[must_use]
    pub fn new(db: Arc<Database>, upload_dir: PathBuf, max_upload_bytes: u64) -> Self {
        Self {
            repo: BookRepo::new(db),
            upload_dir,
            max_upload_bytes,
        }
    }

    fn file_path(&self, id: &str) -> PathBuf {
        self.upload_dir.join(format!("{id}.epub"))
    }

    /// List books ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<Book>> {
        self.repo.list().await
    }

    /// Load one book's metadata.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the book does not exist.
    pub async fn get(&self, id: &str) -> Result<Book> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book {id} not found")))
    }

    /// Validate and store an uploaded e-book.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the file is empty, too large, not
    /// named `.epub` or not a ZIP archive, and `AppError::Io` if the file
    /// cannot be written.
    pub async fn upload(&self, upload: Upload) -> Result<Stored> {
        validate_upload(&upload, self.max_upload_bytes)?;

        let sha256 = hex_digest(&upload.bytes);
        if let Some(book) = self.repo.get_by_sha256(&sha256).await? {
            info!(book_id = %book.id, "identical book already uploaded");
            return Ok(Stored {
                book,
                created: false,
            });
        }

        let title = clean(upload.title).unwrap_or_else(|| file_stem(&upload.file_name));
        let file_size = i64::try_from(upload.bytes.len())
            .map_err(|_| AppError::Validation("file is too large".into()))?;
        let book = Book::new(
            title,
            clean(upload.author),
            upload.file_name,
            file_size,
            sha256,
        );

        fs::create_dir_all(&self.upload_dir).await?;
        let path = self.file_path(&book.id);
        fs::write(&path, &upload.bytes).await?;

        let created = match self.repo.create(&book).await {
            Ok(created) => created,
            Err(err) => {
                remove_file(&path).await;
                return Err(err);
            }
        };

        if let Some(book) = created {
            info!(book_id = %book.id, bytes = book.file_size, "book uploaded");
            return Ok(Stored {
                book,
                created: true,
            });
        }

        // A concurrent upload of the same file won the insert.
        remove_file(&path).await;
        let book = self.repo.get_by_sha256(&book.sha256).await?.ok_or_else(|| {
            AppError::Db(format!("book with digest {} vanished", book.sha256))
        })?;
        info!(book_id = %book.id, "identical book uploaded concurrently");
        Ok(Stored {
            book,
            created: false,
        })
    }

    /// Read a book's stored bytes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the book or its file is missing.
    pub async fn read_file(&self, id: &str) -> Result<(Book, Vec<u8>)> {
        let book = self.get(id).await?;
        match fs::read(self.file_path(&book.id)).await {
            Ok(bytes) => Ok((book, bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("file for book {id} is missing"),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete a book, its reading progress and its file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the book does not exist.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(format!("book {id} not found")));
        }
        remove_file(&self.file_path(id)).await;
        info!(book_id = %id, "book deleted");
        Ok(())
    }

    /// Reading progress, or the unread default when never saved.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the book does not exist.
    pub async fn progress(&self, id: &str) -> Result<ReadingProgress> {
        let book = self.get(id).await?;
        Ok(self
            .repo
            .get_progress(&book.id)
            .await?
            .unwrap_or_else(|| ReadingProgress::unread(book.id)))
    }

    /// Save reading progress.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `percentage` is outside 0..=100 and
    /// `AppError::NotFound` if the book does not exist.
    pub async fn save_progress(
        &self,
        id: &str,
        location: Option<String>,
        percentage: f64,
    ) -> Result<ReadingProgress> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(AppError::Validation(
                "percentage must lie between 0 and 100".into(),
            ));
        }
        let book = self.get(id).await?;
        let progress = ReadingProgress {
            book_id: book.id,
            location: clean(location),
            percentage,
            updated_at: Some(Utc::now()),
        };
        self.repo.save_progress(&progress).await
    }
}

/// Check an upload against the shelf's acceptance rules.
///
/// # Errors
///
/// Returns `AppError::Validation` describing the first failed rule.
pub fn validate_upload(upload: &Upload, max_upload_bytes: u64) -> Result<()> {
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".into()));
    }
    let size = upload.bytes.len() as u64;
    if size > max_upload_bytes {
        return Err(AppError::Validation(format!(
            "uploaded file is {size} bytes; the limit is {max_upload_bytes}"
        )));
    }
    let is_epub = Path::new(&upload.file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));
    if !is_epub {
        return Err(AppError::Validation("only .epub files are accepted".into()));
    }
    if !upload.bytes.starts_with(ZIP_MAGIC) {
        return Err(AppError::Validation(
            "file is not a valid epub archive".into(),
        ));
    }
    Ok(())
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn hex_digest(bytes: &[u8]) -> String {
    use std::fmt::Write;

    Sha256::digest(bytes)
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .unwrap_or("Untitled")
        .to_owned()
}

async fn remove_file(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), %err, "failed to remove book file");
        }
    }
}
