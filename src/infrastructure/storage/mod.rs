use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::error;

use crate::errors::AppError;

/// Where image bytes live. One flat directory of opaquely-named files; the
/// stored filename is always a fresh uuid, so concurrent uploads never
/// contend on a path.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), AppError>;
    async fn load(&self, filename: &str) -> Result<Vec<u8>, AppError>;
}

#[derive(Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FsImageStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), AppError> {
        // Write failures must reach the caller; the record is only inserted
        // after the bytes are on disk.
        tokio::fs::write(self.path_for(filename), bytes)
            .await
            .map_err(|e| {
                error!("Failed to write image {}: {}", filename, e);
                AppError::StorageWriteFailed(e.to_string())
            })
    }

    async fn load(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(self.path_for(filename))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => AppError::NotFound("Image doesn't exist".to_string()),
                _ => {
                    error!("Failed to read image {}: {}", filename, e);
                    AppError::InternalError(e.to_string())
                }
            })
    }
}
