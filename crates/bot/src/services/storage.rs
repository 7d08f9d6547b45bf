//! Local file storage for project deliverables and order results.
//!
//! Files live under the uploads directory:
//!
//! ```text
//! uploads/
//!   projects/<project_id>/<uuid>_<name>
//!   orders/<order_id>/<uuid>_<name>
//! ```
//!
//! Paths stored in the database are relative to the uploads directory.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use studybot_core::{OrderId, ProjectId};

/// Largest file the Bot API lets a bot download.
pub const MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

const MAX_NAME_LEN: usize = 100;

/// Errors from reading or writing stored files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored path points outside the uploads directory.
    #[error("invalid stored path: {0}")]
    InvalidPath(String),

    /// The file exceeds [`MAX_FILE_BYTES`].
    #[error("file is too large: {size} bytes")]
    TooLarge { size: u64 },
}

/// A file read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name to show the recipient, without the storage prefix.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Filesystem-backed storage rooted at the uploads directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the `projects/` and `orders/` directories.
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be created.
    pub async fn init(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.root.join("projects")).await?;
        tokio::fs::create_dir_all(self.root.join("orders")).await?;
        Ok(())
    }

    /// Store a project deliverable, returning its relative path.
    ///
    /// # Errors
    ///
    /// Returns error if the file is too large or cannot be written.
    pub async fn save_project_file(
        &self,
        project_id: ProjectId,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        self.save(&format!("projects/{project_id}"), original_name, bytes)
            .await
    }

    /// Store the finished work for a custom order, returning its relative path.
    ///
    /// # Errors
    ///
    /// Returns error if the file is too large or cannot be written.
    pub async fn save_order_result(
        &self,
        order_id: OrderId,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        self.save(&format!("orders/{order_id}"), original_name, bytes)
            .await
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn save(
        &self,
        dir: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if size > MAX_FILE_BYTES {
            return Err(StorageError::TooLarge { size });
        }

        let file_name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(original_name));
        let relative = format!("{dir}/{file_name}");

        tokio::fs::create_dir_all(self.root.join(dir)).await?;
        tokio::fs::write(self.root.join(&relative), bytes).await?;

        debug!(path = %relative, "Stored file");
        Ok(relative)
    }

    /// Read a stored file back.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for paths that escape the uploads
    /// directory, or `StorageError::Io` if the file cannot be read.
    pub async fn read(&self, relative: &str) -> Result<StoredFile, StorageError> {
        let path = self.resolve(relative)?;
        let bytes = tokio::fs::read(&path).await?;

        Ok(StoredFile {
            file_name: display_name(relative),
            bytes,
        })
    }

    /// Returns true if the stored file exists.
    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        let safe = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

/// Reduce a user-supplied name to `[A-Za-z0-9._-]`, keeping the extension.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "file".to_string();
    }

    let len = cleaned.len();
    if len <= MAX_NAME_LEN {
        cleaned.to_string()
    } else {
        cleaned[len - MAX_NAME_LEN..].to_string()
    }
}

/// Original file name of a stored path (`projects/3/<uuid>_report.pdf` → `report.pdf`).
#[must_use]
pub fn display_name(relative: &str) -> String {
    let file = relative.rsplit('/').next().unwrap_or(relative);
    match file.split_once('_') {
        Some((prefix, rest)) if prefix.len() == 32 && !rest.is_empty() => rest.to_string(),
        _ => file.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Курсовая работа.docx"), "_______________.docx");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("..hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("shop_v2-final.zip"), "shop_v2-final.zip");
    }

    #[test]
    fn test_display_name_strips_prefix() {
        assert_eq!(
            display_name("projects/3/0f8c2e4a9b1d4c7e8f6a5b3c2d1e0f9a_report.pdf"),
            "report.pdf"
        );
        assert_eq!(display_name("projects/3/report.pdf"), "report.pdf");
    }

    #[tokio::test]
    async fn test_save_and_read_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.init().await.unwrap();

        let path = storage
            .save_project_file(ProjectId::new(7), "Django shop.zip", b"PK\x03\x04")
            .await
            .unwrap();

        assert!(path.starts_with("projects/7/"));
        assert!(path.ends_with("_Django_shop.zip"));
        assert!(storage.exists(&path).await);

        let stored = storage.read(&path).await.unwrap();
        assert_eq!(stored.file_name, "Django_shop.zip");
        assert_eq!(stored.bytes, b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_read_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let err = storage.read("../secrets.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
        let err = storage.read("/etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
        assert!(!storage.exists("../secrets.txt").await);
    }
}
