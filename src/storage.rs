use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoStoreError {
    #[error("not_found")]
    NotFound,
    #[error("other: {0}")]
    Other(String),
}

/// Upload storage for raw video files. Serving the files back is handled
/// by an external collaborator (CDN / reverse proxy), so there is no load
/// path here.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), VideoStoreError>;
    async fn delete(&self, file_name: &str) -> Result<(), VideoStoreError>;
}

/// Local-filesystem store, the default backend. Directory comes from
/// `REELHUB_UPLOAD_DIR` (default `uploads/videos`).
pub struct FsVideoStore {
    root: PathBuf,
}

impl FsVideoStore {
    pub fn new() -> Self {
        let root = std::env::var("REELHUB_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads/videos"));
        Self { root }
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

impl Default for FsVideoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoStore for FsVideoStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<(), VideoStoreError> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| VideoStoreError::Other(e.to_string()))?;
        std::fs::write(self.path_for(file_name), bytes)
            .map_err(|e| VideoStoreError::Other(e.to_string()))
    }

    async fn delete(&self, file_name: &str) -> Result<(), VideoStoreError> {
        match std::fs::remove_file(self.path_for(file_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(VideoStoreError::NotFound)
            }
            Err(e) => Err(VideoStoreError::Other(e.to_string())),
        }
    }
}

pub fn build_video_store() -> Arc<dyn VideoStore> {
    Arc::new(FsVideoStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_and_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsVideoStore {
            root: dir.path().to_path_buf(),
        };
        store.save("clip.mp4", b"bytes").await.unwrap();
        assert!(dir.path().join("clip.mp4").exists());
        store.delete("clip.mp4").await.unwrap();
        assert!(matches!(
            store.delete("clip.mp4").await,
            Err(VideoStoreError::NotFound)
        ));
    }
}
