//! Local upload storage: date-partitioned directory tree with
//! timestamp-prefixed filenames.

use crate::data::DataResult;
use chrono::Utc;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Persist uploaded bytes under `<root>/YYYY/MM/DD/HHMMSS_<filename>`
    /// and return the stored path.
    pub async fn save_file(&self, filename: &str, bytes: &[u8]) -> DataResult<PathBuf> {
        let now = Utc::now();
        let dir = self.root.join(now.format("%Y/%m/%d").to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let safe_name = format!("{}_{}", now.format("%H%M%S"), sanitize_filename(filename));
        let path = dir.join(safe_name);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!("Stored upload at {}", path.display());
        Ok(path)
    }

    pub async fn read_file(&self, path: &str) -> DataResult<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    pub async fn delete_file(&self, path: &str) -> DataResult<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep uploads from escaping the storage tree: path separators and parent
/// components are stripped down to the bare file name.
fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.is_empty() || name == ".." {
        "upload".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tokenscout-test-{}", Uuid::new_v4()))
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.docx"), "report.docx");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[tokio::test]
    async fn test_save_and_read_round_trip() {
        let storage = LocalStorage::new(scratch_dir());
        let path = storage
            .save_file("report.docx", b"content")
            .await
            .expect("save should succeed");

        let bytes = storage
            .read_file(&path.to_string_lossy())
            .await
            .expect("read should succeed");
        assert_eq!(bytes, b"content");

        let deleted = storage
            .delete_file(&path.to_string_lossy())
            .await
            .expect("delete should succeed");
        assert!(deleted);

        let deleted_again = storage
            .delete_file(&path.to_string_lossy())
            .await
            .expect("second delete should not error");
        assert!(!deleted_again);
    }
}
