use std::sync::Arc;

use chrono::Utc;
use grantlens_core::{AppResult, InstanceId};
use grantlens_domain::{ReportRow, UserRecord};
use tracing::info;

use crate::{ArtifactRef, ArtifactSink, NotificationPublisher, SnapshotStore};

mod render;
mod rows;

use render::{notification_body, render_report, report_file_name};

/// Subject line of the completion notification.
const REPORT_SUBJECT: &str = "Access entitlement report completed";

/// Application service joining the collected snapshots into a flattened
/// per-user entitlement report.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn SnapshotStore>,
    sink: Arc<dyn ArtifactSink>,
    notifications: Arc<dyn NotificationPublisher>,
}

impl ReportService {
    /// Creates a reporter from the injected store and delivery ports.
    #[must_use]
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        sink: Arc<dyn ArtifactSink>,
        notifications: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            store,
            sink,
            notifications,
        }
    }

    /// Builds the report for one instance scope, stores it in the sink and
    /// publishes a completion notification naming the artifact.
    ///
    /// Rows are emitted in user-then-identity-then-permission-set order. Any
    /// store read failure aborts the run before anything reaches the sink.
    pub async fn run_report(&self, instance_id: &InstanceId) -> AppResult<ArtifactRef> {
        let users = self.scan_all_users().await?;

        let mut report_rows: Vec<ReportRow> = Vec::new();
        for user in &users {
            self.append_user_rows(instance_id, user, &mut report_rows)
                .await?;
        }

        let report = render_report(&report_rows)?;
        let file_name = report_file_name(Utc::now().date_naive());
        let artifact = self.sink.store(file_name.as_str(), report).await?;

        info!(
            instance_id = %instance_id,
            users = users.len(),
            rows = report_rows.len(),
            artifact = %artifact.location,
            "access report stored"
        );

        self.notifications
            .publish(
                REPORT_SUBJECT,
                notification_body(artifact.location.as_str()).as_str(),
            )
            .await?;

        Ok(artifact)
    }

    async fn scan_all_users(&self) -> AppResult<Vec<UserRecord>> {
        let mut page = self.store.scan_users(None).await?;
        let mut users = page.items;
        while let Some(token) = page.next_token {
            page = self.store.scan_users(Some(token.as_str())).await?;
            users.extend(page.items);
        }

        Ok(users)
    }
}
