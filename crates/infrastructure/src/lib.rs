//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_notification_publisher;
mod filesystem_artifact_sink;
mod http_authority_client;
mod http_identity_client;
mod http_policy_resolver;
mod in_memory_snapshot_store;
mod postgres_snapshot_store;
mod remote;
mod webhook_notification_publisher;

pub use console_notification_publisher::ConsoleNotificationPublisher;
pub use filesystem_artifact_sink::FilesystemArtifactSink;
pub use http_authority_client::HttpAuthorityClient;
pub use http_identity_client::HttpIdentityClient;
pub use http_policy_resolver::HttpPolicyResolver;
pub use in_memory_snapshot_store::InMemorySnapshotStore;
pub use postgres_snapshot_store::PostgresSnapshotStore;
pub use remote::RemoteServiceConfig;
pub use webhook_notification_publisher::{WebhookConfig, WebhookNotificationPublisher};
