//! Filesystem artifact sink writing reports under a configured directory.

use std::path::PathBuf;

use async_trait::async_trait;
use grantlens_application::{ArtifactRef, ArtifactSink};
use grantlens_core::{AppError, AppResult};

/// Artifact sink storing report files on the local filesystem.
#[derive(Debug, Clone)]
pub struct FilesystemArtifactSink {
    output_dir: PathBuf,
}

impl FilesystemArtifactSink {
    /// Creates a sink rooted at the given output directory. The directory is
    /// created on first store.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl ArtifactSink for FilesystemArtifactSink {
    async fn store(&self, name: &str, bytes: Vec<u8>) -> AppResult<ArtifactRef> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to create report directory '{}': {error}",
                    self.output_dir.display()
                ))
            })?;

        let path = self.output_dir.join(name);
        tokio::fs::write(&path, bytes).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write report file '{}': {error}",
                path.display()
            ))
        })?;

        Ok(ArtifactRef {
            location: path.display().to_string(),
        })
    }
}
