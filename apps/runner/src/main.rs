//! Grantlens audit runner.
//!
//! Dispatches a collection run, a report run, or both in sequence against
//! one authority-instance scope. Every run is safe to repeat: collection
//! overwrites snapshots by key and reporting re-derives the report from
//! whatever snapshot is stored.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use grantlens_application::{CollectorService, NotificationPublisher, ReportService};
use grantlens_core::{AppError, AppResult, IdentityStoreId, InstanceId};
use grantlens_infrastructure::{
    ConsoleNotificationPublisher, FilesystemArtifactSink, HttpAuthorityClient, HttpIdentityClient,
    HttpPolicyResolver, PostgresSnapshotStore, RemoteServiceConfig, WebhookConfig,
    WebhookNotificationPublisher,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Collect,
    Report,
    Full,
}

impl RunMode {
    fn from_args() -> AppResult<Self> {
        match env::args().nth(1).as_deref() {
            Some("collect") => Ok(Self::Collect),
            Some("report") => Ok(Self::Report),
            Some("full") | None => Ok(Self::Full),
            Some(other) => Err(AppError::Validation(format!(
                "unknown run mode '{other}', expected 'collect', 'report' or 'full'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
struct RunnerConfig {
    database_url: String,
    instance_id: String,
    identity_store_id: String,
    service_region: String,
    authority_base_url: String,
    policy_base_url: String,
    identity_base_url: String,
    api_token: String,
    report_output_dir: String,
    notify_topic: String,
    notify_webhook_url: Option<String>,
    http_timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mode = RunMode::from_args()?;
    let config = RunnerConfig::load()?;
    let instance_id = InstanceId::new(config.instance_id.as_str())?;
    let identity_store_id = IdentityStoreId::new(config.identity_store_id.as_str())?;

    let pool = connect_pool(config.database_url.as_str()).await?;
    let store = Arc::new(PostgresSnapshotStore::new(pool));
    store.ensure_schema().await?;

    info!(
        mode = ?mode,
        instance_id = %instance_id,
        identity_store_id = %identity_store_id,
        region = %config.service_region,
        "grantlens-runner started"
    );

    if matches!(mode, RunMode::Collect | RunMode::Full) {
        let collector = build_collector(&config, store.clone())?;
        let summary = collector
            .run_collection(&instance_id, &identity_store_id)
            .await?;
        info!(
            permission_sets = summary.permission_sets,
            users = summary.users,
            "collection finished"
        );
    }

    if matches!(mode, RunMode::Report | RunMode::Full) {
        let reporter = build_reporter(&config, store)?;
        let artifact = reporter.run_report(&instance_id).await?;
        info!(artifact = %artifact.location, "report finished");
    }

    Ok(())
}

fn build_collector(
    config: &RunnerConfig,
    store: Arc<PostgresSnapshotStore>,
) -> AppResult<CollectorService> {
    let authority = HttpAuthorityClient::new(config.remote(config.authority_base_url.as_str()))?;
    let policies = HttpPolicyResolver::new(config.remote(config.policy_base_url.as_str()))?;
    let identity = HttpIdentityClient::new(config.remote(config.identity_base_url.as_str()))?;

    Ok(CollectorService::new(
        Arc::new(authority),
        Arc::new(policies),
        Arc::new(identity),
        store,
    ))
}

fn build_reporter(
    config: &RunnerConfig,
    store: Arc<PostgresSnapshotStore>,
) -> AppResult<ReportService> {
    let sink = Arc::new(FilesystemArtifactSink::new(
        config.report_output_dir.as_str(),
    ));
    let notifications: Arc<dyn NotificationPublisher> = match &config.notify_webhook_url {
        Some(endpoint_url) => Arc::new(WebhookNotificationPublisher::new(WebhookConfig {
            endpoint_url: endpoint_url.clone(),
            topic: config.notify_topic.clone(),
            timeout: Duration::from_secs(config.http_timeout_seconds),
        })?),
        None => Arc::new(ConsoleNotificationPublisher::new()),
    };

    Ok(ReportService::new(store, sink, notifications))
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

impl RunnerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let instance_id = required_env("AUTHORITY_INSTANCE_ID")?;
        let identity_store_id = required_env("IDENTITY_STORE_ID")?;
        let service_region = required_env("SERVICE_REGION")?;
        let authority_base_url = base_url_env("AUTHORITY_BASE_URL")?;
        let policy_base_url = match env::var("POLICY_BASE_URL") {
            Ok(value) => value.trim_end_matches('/').to_owned(),
            Err(_) => authority_base_url.clone(),
        };
        let identity_base_url = base_url_env("IDENTITY_BASE_URL")?;
        let api_token = required_env("SERVICE_API_TOKEN")?;
        let report_output_dir =
            env::var("REPORT_OUTPUT_DIR").unwrap_or_else(|_| "./reports".to_owned());
        let notify_topic =
            env::var("NOTIFY_TOPIC").unwrap_or_else(|_| "grantlens-reports".to_owned());
        let notify_webhook_url = env::var("NOTIFY_WEBHOOK_URL")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let http_timeout_seconds = parse_env_u64("HTTP_TIMEOUT_SECONDS", 30)?;

        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            instance_id,
            identity_store_id,
            service_region,
            authority_base_url,
            policy_base_url,
            identity_base_url,
            api_token,
            report_output_dir,
            notify_topic,
            notify_webhook_url,
            http_timeout_seconds,
        })
    }

    fn remote(&self, base_url: &str) -> RemoteServiceConfig {
        RemoteServiceConfig {
            base_url: base_url.to_owned(),
            region: self.service_region.clone(),
            api_token: self.api_token.clone(),
            timeout: Duration::from_secs(self.http_timeout_seconds),
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn base_url_env(name: &str) -> AppResult<String> {
    Ok(required_env(name)?.trim_end_matches('/').to_owned())
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
