//! In-memory snapshot store for tests and local runs.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use grantlens_application::SnapshotStore;
use grantlens_core::{AppResult, InstanceId, Page};
use grantlens_domain::{PermissionSetDocument, PermissionSetRecord, UserDocument, UserRecord};
use tokio::sync::RwLock;

const DEFAULT_PAGE_SIZE: usize = 100;

/// In-memory snapshot store holding the same document forms as the
/// PostgreSQL adapter, with overwrite-by-key writes and keyset-paginated
/// reads.
#[derive(Debug)]
pub struct InMemorySnapshotStore {
    page_size: usize,
    permission_sets: RwLock<BTreeMap<(String, String), PermissionSetDocument>>,
    users: RwLock<BTreeMap<String, UserDocument>>,
}

impl InMemorySnapshotStore {
    /// Creates an empty store with the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty store with a custom page size, letting tests
    /// exercise multi-page scans with small data sets.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            permission_sets: RwLock::new(BTreeMap::new()),
            users: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put_permission_set(&self, record: PermissionSetRecord) -> AppResult<()> {
        let key = (record.instance_id.clone(), record.permission_set_id.clone());
        self.permission_sets
            .write()
            .await
            .insert(key, PermissionSetDocument::from(record));
        Ok(())
    }

    async fn put_user(&self, record: UserRecord) -> AppResult<()> {
        self.users
            .write()
            .await
            .insert(record.user_id.clone(), UserDocument::from(record));
        Ok(())
    }

    async fn scan_users(&self, page_token: Option<&str>) -> AppResult<Page<UserRecord>> {
        let users = self.users.read().await;
        let lower = match page_token {
            Some(token) => Bound::Excluded(token.to_owned()),
            None => Bound::Unbounded,
        };

        let documents: Vec<UserDocument> = users
            .range((lower, Bound::Unbounded))
            .take(self.page_size + 1)
            .map(|(_, document)| document.clone())
            .collect();
        drop(users);

        paginate(documents, self.page_size, |document| {
            document.user_id.clone()
        })
    }

    async fn query_permission_sets_by_principal(
        &self,
        instance_id: &InstanceId,
        principal_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<PermissionSetRecord>> {
        let permission_sets = self.permission_sets.read().await;
        let lower = match page_token {
            Some(token) => {
                Bound::Excluded((instance_id.as_str().to_owned(), token.to_owned()))
            }
            None => Bound::Included((instance_id.as_str().to_owned(), String::new())),
        };

        let documents: Vec<PermissionSetDocument> = permission_sets
            .range((lower, Bound::Unbounded))
            .take_while(|((stored_instance_id, _), _)| stored_instance_id == instance_id.as_str())
            .filter(|(_, document)| {
                document
                    .principal_ids
                    .iter()
                    .any(|stored_principal_id| stored_principal_id == principal_id)
            })
            .take(self.page_size + 1)
            .map(|(_, document)| document.clone())
            .collect();
        drop(permission_sets);

        paginate(documents, self.page_size, |document| {
            document.permission_set_id.clone()
        })
    }
}

/// Converts up to one page of documents, using the extra fetched item to
/// decide whether a continuation token is needed.
fn paginate<D, R>(
    mut documents: Vec<D>,
    page_size: usize,
    key_of: impl Fn(&D) -> String,
) -> AppResult<Page<R>>
where
    R: TryFrom<D, Error = grantlens_core::AppError>,
{
    let has_more = documents.len() > page_size;
    if has_more {
        documents.truncate(page_size);
    }
    let next_token = has_more
        .then(|| documents.last().map(&key_of))
        .flatten();

    let items = documents
        .into_iter()
        .map(R::try_from)
        .collect::<AppResult<Vec<R>>>()?;

    Ok(Page::new(items, next_token))
}

#[cfg(test)]
mod tests {
    use grantlens_domain::{Grant, GroupMembership, PrincipalType};

    use super::*;

    fn instance() -> InstanceId {
        InstanceId::new("ssoins-1").unwrap_or_else(|error| panic!("invalid instance id: {error}"))
    }

    fn permission_set(
        instance_id: &str,
        permission_set_id: &str,
        name: &str,
        principal_ids: &[&str],
    ) -> PermissionSetRecord {
        PermissionSetRecord {
            instance_id: instance_id.to_owned(),
            permission_set_id: permission_set_id.to_owned(),
            name: name.to_owned(),
            grants: principal_ids
                .iter()
                .map(|principal_id| Grant {
                    principal_id: (*principal_id).to_owned(),
                    principal_type: PrincipalType::User,
                    account_id: "111111111111".to_owned(),
                })
                .collect(),
            managed_policies: vec![],
            inline_policy: String::new(),
            customer_managed_policy_refs: vec![],
            permission_boundary: String::new(),
        }
    }

    fn user(user_id: &str, user_name: &str) -> UserRecord {
        UserRecord {
            user_id: user_id.to_owned(),
            user_name: user_name.to_owned(),
            memberships: vec![GroupMembership {
                group_id: "g-1".to_owned(),
                group_name: "Engineers".to_owned(),
            }],
        }
    }

    async fn all_users(store: &InMemorySnapshotStore) -> Vec<UserRecord> {
        let mut page = store
            .scan_users(None)
            .await
            .unwrap_or_else(|error| panic!("scan failed: {error}"));
        let mut users = page.items;
        while let Some(token) = page.next_token {
            page = store
                .scan_users(Some(token.as_str()))
                .await
                .unwrap_or_else(|error| panic!("scan failed: {error}"));
            users.extend(page.items);
        }
        users
    }

    async fn query_all(
        store: &InMemorySnapshotStore,
        principal_id: &str,
    ) -> Vec<PermissionSetRecord> {
        let mut page = store
            .query_permission_sets_by_principal(&instance(), principal_id, None)
            .await
            .unwrap_or_else(|error| panic!("query failed: {error}"));
        let mut records = page.items;
        while let Some(token) = page.next_token {
            page = store
                .query_permission_sets_by_principal(&instance(), principal_id, Some(token.as_str()))
                .await
                .unwrap_or_else(|error| panic!("query failed: {error}"));
            records.extend(page.items);
        }
        records
    }

    #[tokio::test]
    async fn put_permission_set_overwrites_by_key() {
        let store = InMemorySnapshotStore::new();
        store
            .put_permission_set(permission_set("ssoins-1", "ps-1", "Old", &["u-1"]))
            .await
            .unwrap_or_else(|error| panic!("put failed: {error}"));
        store
            .put_permission_set(permission_set("ssoins-1", "ps-1", "New", &["u-1"]))
            .await
            .unwrap_or_else(|error| panic!("put failed: {error}"));

        let records = query_all(&store, "u-1").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "New");
    }

    #[tokio::test]
    async fn query_filters_by_instance_scope_and_principal_containment() {
        let store = InMemorySnapshotStore::new();
        store
            .put_permission_set(permission_set("ssoins-1", "ps-1", "Admins", &["u-1", "g-1"]))
            .await
            .unwrap_or_else(|error| panic!("put failed: {error}"));
        store
            .put_permission_set(permission_set("ssoins-1", "ps-2", "Viewers", &["g-1"]))
            .await
            .unwrap_or_else(|error| panic!("put failed: {error}"));
        store
            .put_permission_set(permission_set("ssoins-2", "ps-3", "Other", &["u-1"]))
            .await
            .unwrap_or_else(|error| panic!("put failed: {error}"));

        let records = query_all(&store, "u-1").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].permission_set_id, "ps-1");

        let records = query_all(&store, "g-1").await;
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn query_paginates_matching_records() {
        let store = InMemorySnapshotStore::with_page_size(1);
        for index in 0..3 {
            store
                .put_permission_set(permission_set(
                    "ssoins-1",
                    &format!("ps-{index}"),
                    &format!("Set {index}"),
                    &["u-1"],
                ))
                .await
                .unwrap_or_else(|error| panic!("put failed: {error}"));
        }

        let first_page = store
            .query_permission_sets_by_principal(&instance(), "u-1", None)
            .await
            .unwrap_or_else(|error| panic!("query failed: {error}"));
        assert_eq!(first_page.items.len(), 1);
        assert!(first_page.next_token.is_some());

        let records = query_all(&store, "u-1").await;
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn scan_users_pages_completely_in_key_order() {
        let store = InMemorySnapshotStore::with_page_size(2);
        for index in [3, 0, 4, 1, 2] {
            store
                .put_user(user(&format!("u-{index}"), &format!("user{index}")))
                .await
                .unwrap_or_else(|error| panic!("put failed: {error}"));
        }

        let users = all_users(&store).await;
        let user_ids: Vec<&str> = users.iter().map(|record| record.user_id.as_str()).collect();
        assert_eq!(user_ids, vec!["u-0", "u-1", "u-2", "u-3", "u-4"]);
    }

    #[tokio::test]
    async fn empty_store_scans_to_a_single_empty_page() {
        let store = InMemorySnapshotStore::with_page_size(2);

        let page = store
            .scan_users(None)
            .await
            .unwrap_or_else(|error| panic!("scan failed: {error}"));
        assert!(page.items.is_empty());
        assert!(page.next_token.is_none());
    }
}
