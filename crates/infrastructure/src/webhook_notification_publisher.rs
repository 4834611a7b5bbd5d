//! Webhook notification publisher posting completion messages as JSON.

use std::time::Duration;

use async_trait::async_trait;
use grantlens_application::NotificationPublisher;
use grantlens_core::{AppError, AppResult};
use serde::Serialize;

/// Delivery settings for webhook notifications.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Endpoint receiving the notification POST.
    pub endpoint_url: String,
    /// Topic the notification is published under.
    pub topic: String,
    /// Request timeout applied to every delivery.
    pub timeout: Duration,
}

/// Notification publisher delivering to an HTTP webhook.
pub struct WebhookNotificationPublisher {
    http_client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotificationPublisher {
    /// Creates a publisher from the delivery configuration.
    pub fn new(config: WebhookConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[derive(Debug, Serialize)]
struct NotificationPayload<'a> {
    topic: &'a str,
    subject: &'a str,
    message: &'a str,
}

#[async_trait]
impl NotificationPublisher for WebhookNotificationPublisher {
    async fn publish(&self, subject: &str, body: &str) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.config.endpoint_url.as_str())
            .json(&NotificationPayload {
                topic: self.config.topic.as_str(),
                subject,
                message: body,
            })
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to deliver notification: {error}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Internal(format!(
                "notification endpoint returned status {}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}
