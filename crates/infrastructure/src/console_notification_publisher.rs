//! Console notification publisher for development. Logs notifications to
//! tracing output.

use async_trait::async_trait;
use grantlens_application::NotificationPublisher;
use grantlens_core::AppResult;
use tracing::info;

/// Development notification publisher that logs to the console.
#[derive(Clone)]
pub struct ConsoleNotificationPublisher;

impl ConsoleNotificationPublisher {
    /// Creates a new console notification publisher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotificationPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationPublisher for ConsoleNotificationPublisher {
    async fn publish(&self, subject: &str, body: &str) -> AppResult<()> {
        info!(
            subject = subject,
            "--- NOTIFICATION (console) ---\nSubject: {}\n\n{}\n--- END NOTIFICATION ---",
            subject,
            body
        );

        Ok(())
    }
}
