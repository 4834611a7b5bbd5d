//! PostgreSQL-backed snapshot store persisting JSONB documents.

use async_trait::async_trait;
use grantlens_application::SnapshotStore;
use grantlens_core::{AppError, AppResult, InstanceId, Page};
use grantlens_domain::{PermissionSetDocument, PermissionSetRecord, UserDocument, UserRecord};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

const SCAN_PAGE_SIZE: i64 = 100;

/// PostgreSQL-backed snapshot store.
///
/// Records are stored as one JSONB document per key; writes upsert, so the
/// last collection run wins for every key. Reads decode through the domain
/// document conversions, surfacing corrupt documents as validation errors at
/// the store boundary.
#[derive(Clone)]
pub struct PostgresSnapshotStore {
    pool: PgPool,
}

impl PostgresSnapshotStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the snapshot tables when they do not exist yet.
    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS permission_set_snapshots (
                instance_id TEXT NOT NULL,
                permission_set_id TEXT NOT NULL,
                document JSONB NOT NULL,
                PRIMARY KEY (instance_id, permission_set_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create permission_set_snapshots table: {error}"
            ))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_snapshots (
                user_id TEXT PRIMARY KEY,
                document JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create user_snapshots table: {error}"))
        })?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    document: Value,
}

fn encode<T: serde::Serialize>(document: &T) -> AppResult<Value> {
    serde_json::to_value(document)
        .map_err(|error| AppError::Internal(format!("failed to encode snapshot document: {error}")))
}

fn decode<D, R>(row: DocumentRow) -> AppResult<R>
where
    D: serde::de::DeserializeOwned,
    R: TryFrom<D, Error = AppError>,
{
    let document: D = serde_json::from_value(row.document).map_err(|error| {
        AppError::Validation(format!("corrupt snapshot document: {error}"))
    })?;
    R::try_from(document)
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn put_permission_set(&self, record: PermissionSetRecord) -> AppResult<()> {
        let document = PermissionSetDocument::from(record);
        sqlx::query(
            r#"
            INSERT INTO permission_set_snapshots (instance_id, permission_set_id, document)
            VALUES ($1, $2, $3)
            ON CONFLICT (instance_id, permission_set_id)
            DO UPDATE SET document = EXCLUDED.document
            "#,
        )
        .bind(document.instance_id.as_str())
        .bind(document.permission_set_id.as_str())
        .bind(encode(&document)?)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store permission set '{}': {error}",
                document.permission_set_id
            ))
        })?;

        Ok(())
    }

    async fn put_user(&self, record: UserRecord) -> AppResult<()> {
        let document = UserDocument::from(record);
        sqlx::query(
            r#"
            INSERT INTO user_snapshots (user_id, document)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET document = EXCLUDED.document
            "#,
        )
        .bind(document.user_id.as_str())
        .bind(encode(&document)?)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store user '{}': {error}",
                document.user_id
            ))
        })?;

        Ok(())
    }

    async fn scan_users(&self, page_token: Option<&str>) -> AppResult<Page<UserRecord>> {
        let mut rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT document
            FROM user_snapshots
            WHERE ($1::TEXT IS NULL OR user_id > $1)
            ORDER BY user_id
            LIMIT $2
            "#,
        )
        .bind(page_token)
        .bind(SCAN_PAGE_SIZE + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to scan users: {error}")))?;

        let has_more = rows.len() as i64 > SCAN_PAGE_SIZE;
        if has_more {
            rows.truncate(usize::try_from(SCAN_PAGE_SIZE).unwrap_or(usize::MAX));
        }

        let users = rows
            .into_iter()
            .map(decode::<UserDocument, UserRecord>)
            .collect::<AppResult<Vec<UserRecord>>>()?;
        let next_token = has_more
            .then(|| users.last().map(|user| user.user_id.clone()))
            .flatten();

        Ok(Page::new(users, next_token))
    }

    async fn query_permission_sets_by_principal(
        &self,
        instance_id: &InstanceId,
        principal_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<PermissionSetRecord>> {
        let mut rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT document
            FROM permission_set_snapshots
            WHERE instance_id = $1
              AND document->'principal_ids' @> to_jsonb($2::TEXT)
              AND ($3::TEXT IS NULL OR permission_set_id > $3)
            ORDER BY permission_set_id
            LIMIT $4
            "#,
        )
        .bind(instance_id.as_str())
        .bind(principal_id)
        .bind(page_token)
        .bind(SCAN_PAGE_SIZE + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to query permission sets for principal '{principal_id}': {error}"
            ))
        })?;

        let has_more = rows.len() as i64 > SCAN_PAGE_SIZE;
        if has_more {
            rows.truncate(usize::try_from(SCAN_PAGE_SIZE).unwrap_or(usize::MAX));
        }

        let records = rows
            .into_iter()
            .map(decode::<PermissionSetDocument, PermissionSetRecord>)
            .collect::<AppResult<Vec<PermissionSetRecord>>>()?;
        let next_token = has_more
            .then(|| {
                records
                    .last()
                    .map(|record| record.permission_set_id.clone())
            })
            .flatten();

        Ok(Page::new(records, next_token))
    }
}
