use async_trait::async_trait;
use grantlens_core::AppResult;

/// Reference to a stored report artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Location of the artifact in the sink, suitable for a notification.
    pub location: String,
}

/// Port for the durable sink receiving the finished report file.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Stores a named byte stream and returns its reference.
    async fn store(&self, name: &str, bytes: Vec<u8>) -> AppResult<ArtifactRef>;
}

/// Port for the fire-and-forget completion notification channel.
///
/// The destination topic is adapter configuration, fixed at construction.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publishes one notification.
    async fn publish(&self, subject: &str, body: &str) -> AppResult<()>;
}
