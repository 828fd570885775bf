use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory-backed storage for accepted upload files.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Store uploads under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory uploads are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a fresh `<uuid>.<extension>` name and return that name.
    pub async fn save(&self, bytes: &[u8], extension: &str) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;
        let filename = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::write(self.root.join(&filename), bytes).await?;
        tracing::info!(filename = %filename, bytes = bytes.len(), "Upload stored");
        Ok(filename)
    }

    /// Best-effort removal of a stored upload; failures are logged, not returned.
    pub async fn remove(&self, filename: &str) {
        if let Err(error) = tokio::fs::remove_file(self.root.join(filename)).await {
            tracing::warn!(filename = %filename, error = %error, "Failed to remove stored upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saves_with_unique_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().join("materials"));

        let first = storage.save(b"alpha", "txt").await.expect("save");
        let second = storage.save(b"beta", "txt").await.expect("save");

        assert_ne!(first, second);
        assert!(first.ends_with(".txt"));
        let stored = tokio::fs::read(storage.root().join(&first))
            .await
            .expect("read back");
        assert_eq!(stored, b"alpha");
    }
}
