use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use grantlens_core::{AppError, AppResult, IdentityStoreId, InstanceId, Page};
use grantlens_domain::{CustomerManagedPolicyRef, PermissionSetRecord, PrincipalType, UserRecord};
use serde_json::json;
use tokio::sync::Mutex;

use super::CollectorService;
use crate::{
    AccountAssignment, AttachedManagedPolicy, AuthorityClient, DirectoryUser,
    IdentityDirectoryClient, PermissionSetDescription, PolicyResolver, SnapshotStore,
};

fn instance() -> InstanceId {
    InstanceId::new("ssoins-1").unwrap_or_else(|error| panic!("invalid instance id: {error}"))
}

fn identity_store() -> IdentityStoreId {
    IdentityStoreId::new("d-1234").unwrap_or_else(|error| panic!("invalid store id: {error}"))
}

fn page_of<T: Clone>(items: &[T], page_size: usize, token: Option<&str>) -> AppResult<Page<T>> {
    if page_size == 0 {
        return Ok(Page::last(items.to_vec()));
    }
    let start = match token {
        Some(token) => token.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid page token '{token}': {error}"))
        })?,
        None => 0,
    };
    let end = usize::min(start + page_size, items.len());
    let next_token = (end < items.len()).then(|| end.to_string());

    Ok(Page::new(items[start..end].to_vec(), next_token))
}

fn user_assignment(principal_id: &str, account_id: &str) -> AccountAssignment {
    AccountAssignment {
        principal_id: principal_id.to_owned(),
        principal_type: PrincipalType::User,
        account_id: account_id.to_owned(),
    }
}

enum BoundaryLookup {
    Value(String),
    Broken,
}

#[derive(Default)]
struct FakeAuthorityClient {
    page_size: usize,
    permission_sets: Vec<String>,
    names: HashMap<String, String>,
    accounts: HashMap<String, Vec<String>>,
    assignments: HashMap<(String, String), Vec<AccountAssignment>>,
    attached_policies: HashMap<String, Vec<AttachedManagedPolicy>>,
    inline_policies: HashMap<String, String>,
    customer_refs: HashMap<String, Vec<CustomerManagedPolicyRef>>,
    boundaries: HashMap<String, BoundaryLookup>,
}

impl FakeAuthorityClient {
    fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    fn add_permission_set(&mut self, permission_set_id: &str, name: &str) {
        self.permission_sets.push(permission_set_id.to_owned());
        self.names
            .insert(permission_set_id.to_owned(), name.to_owned());
    }
}

#[async_trait]
impl AuthorityClient for FakeAuthorityClient {
    async fn list_permission_sets(
        &self,
        _instance_id: &InstanceId,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>> {
        page_of(&self.permission_sets, self.page_size, page_token)
    }

    async fn describe_permission_set(
        &self,
        _instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<PermissionSetDescription> {
        let name = self
            .names
            .get(permission_set_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("permission set '{permission_set_id}'")))?;

        Ok(PermissionSetDescription { name })
    }

    async fn list_associated_accounts(
        &self,
        _instance_id: &InstanceId,
        permission_set_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>> {
        let accounts = self
            .accounts
            .get(permission_set_id)
            .cloned()
            .unwrap_or_default();
        page_of(&accounts, self.page_size, page_token)
    }

    async fn list_account_assignments(
        &self,
        _instance_id: &InstanceId,
        permission_set_id: &str,
        account_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<AccountAssignment>> {
        let assignments = self
            .assignments
            .get(&(permission_set_id.to_owned(), account_id.to_owned()))
            .cloned()
            .unwrap_or_default();
        page_of(&assignments, self.page_size, page_token)
    }

    async fn list_attached_managed_policies(
        &self,
        _instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<AttachedManagedPolicy>> {
        Ok(self
            .attached_policies
            .get(permission_set_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_inline_policy(
        &self,
        _instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<String> {
        Ok(self
            .inline_policies
            .get(permission_set_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_customer_managed_policy_refs(
        &self,
        _instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<CustomerManagedPolicyRef>> {
        Ok(self
            .customer_refs
            .get(permission_set_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_permission_boundary(
        &self,
        _instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<String> {
        match self.boundaries.get(permission_set_id) {
            Some(BoundaryLookup::Value(reference)) => Ok(reference.clone()),
            Some(BoundaryLookup::Broken) => Err(AppError::Internal(
                "permission boundary lookup failed".to_owned(),
            )),
            None => Err(AppError::NotFound(format!(
                "no permission boundary for '{permission_set_id}'"
            ))),
        }
    }
}

#[derive(Default)]
struct FakePolicyResolver {
    versions: HashMap<String, String>,
    documents: HashMap<(String, String), serde_json::Value>,
}

#[async_trait]
impl PolicyResolver for FakePolicyResolver {
    async fn default_policy_version(&self, policy_id: &str) -> AppResult<String> {
        self.versions
            .get(policy_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("policy '{policy_id}'")))
    }

    async fn policy_document(
        &self,
        policy_id: &str,
        version_id: &str,
    ) -> AppResult<serde_json::Value> {
        self.documents
            .get(&(policy_id.to_owned(), version_id.to_owned()))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("policy '{policy_id}' v '{version_id}'")))
    }
}

#[derive(Default)]
struct FakeIdentityClient {
    page_size: usize,
    users: Vec<DirectoryUser>,
    memberships: HashMap<String, Vec<String>>,
    group_names: HashMap<String, String>,
}

#[async_trait]
impl IdentityDirectoryClient for FakeIdentityClient {
    async fn list_users(
        &self,
        _identity_store_id: &IdentityStoreId,
        page_token: Option<&str>,
    ) -> AppResult<Page<DirectoryUser>> {
        page_of(&self.users, self.page_size, page_token)
    }

    async fn list_group_memberships(
        &self,
        _identity_store_id: &IdentityStoreId,
        user_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>> {
        let group_ids = self.memberships.get(user_id).cloned().unwrap_or_default();
        page_of(&group_ids, self.page_size, page_token)
    }

    async fn describe_group(
        &self,
        _identity_store_id: &IdentityStoreId,
        group_id: &str,
    ) -> AppResult<String> {
        self.group_names
            .get(group_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("group '{group_id}'")))
    }
}

#[derive(Default)]
struct RecordingSnapshotStore {
    permission_sets: Mutex<Vec<PermissionSetRecord>>,
    users: Mutex<Vec<UserRecord>>,
}

#[async_trait]
impl SnapshotStore for RecordingSnapshotStore {
    async fn put_permission_set(&self, record: PermissionSetRecord) -> AppResult<()> {
        self.permission_sets.lock().await.push(record);
        Ok(())
    }

    async fn put_user(&self, record: UserRecord) -> AppResult<()> {
        self.users.lock().await.push(record);
        Ok(())
    }

    async fn scan_users(&self, _page_token: Option<&str>) -> AppResult<Page<UserRecord>> {
        Ok(Page::last(vec![]))
    }

    async fn query_permission_sets_by_principal(
        &self,
        _instance_id: &InstanceId,
        _principal_id: &str,
        _page_token: Option<&str>,
    ) -> AppResult<Page<PermissionSetRecord>> {
        Ok(Page::last(vec![]))
    }
}

fn collector(
    authority: FakeAuthorityClient,
    policies: FakePolicyResolver,
    identity: FakeIdentityClient,
    store: Arc<RecordingSnapshotStore>,
) -> CollectorService {
    CollectorService::new(
        Arc::new(authority),
        Arc::new(policies),
        Arc::new(identity),
        store,
    )
}

#[tokio::test]
async fn permission_sets_are_collected_across_pages_in_order() {
    let mut authority = FakeAuthorityClient::with_page_size(2);
    for index in 0..5 {
        authority.add_permission_set(&format!("ps-{index}"), &format!("Set {index}"));
    }
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        authority,
        FakePolicyResolver::default(),
        FakeIdentityClient::default(),
        store.clone(),
    );

    let records = service
        .collect_permission_sets(&instance())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    let collected_ids: Vec<&str> = records
        .iter()
        .map(|record| record.permission_set_id.as_str())
        .collect();
    assert_eq!(collected_ids, vec!["ps-0", "ps-1", "ps-2", "ps-3", "ps-4"]);
    assert_eq!(store.permission_sets.lock().await.len(), 5);
}

#[tokio::test]
async fn empty_permission_set_listing_yields_empty_snapshot() {
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        FakeAuthorityClient::with_page_size(2),
        FakePolicyResolver::default(),
        FakeIdentityClient::default(),
        store.clone(),
    );

    let records = service
        .collect_permission_sets(&instance())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    assert!(records.is_empty());
    assert!(store.permission_sets.lock().await.is_empty());
}

#[tokio::test]
async fn assignments_spanning_pages_are_all_collected() {
    let mut authority = FakeAuthorityClient::with_page_size(2);
    authority.add_permission_set("ps-1", "Admins");
    authority
        .accounts
        .insert("ps-1".to_owned(), vec!["111111111111".to_owned()]);
    authority.assignments.insert(
        ("ps-1".to_owned(), "111111111111".to_owned()),
        (0..5)
            .map(|index| user_assignment(&format!("u-{index}"), "111111111111"))
            .collect(),
    );
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        authority,
        FakePolicyResolver::default(),
        FakeIdentityClient::default(),
        store,
    );

    let records = service
        .collect_permission_sets(&instance())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    let grant_principals: Vec<&str> = records[0]
        .grants
        .iter()
        .map(|grant| grant.principal_id.as_str())
        .collect();
    assert_eq!(grant_principals, vec!["u-0", "u-1", "u-2", "u-3", "u-4"]);
}

#[tokio::test]
async fn grants_keep_account_order_and_cross_account_duplicates() {
    let mut authority = FakeAuthorityClient::with_page_size(10);
    authority.add_permission_set("ps-1", "Admins");
    authority.accounts.insert(
        "ps-1".to_owned(),
        vec!["111111111111".to_owned(), "222222222222".to_owned()],
    );
    authority.assignments.insert(
        ("ps-1".to_owned(), "111111111111".to_owned()),
        vec![user_assignment("u-1", "111111111111")],
    );
    authority.assignments.insert(
        ("ps-1".to_owned(), "222222222222".to_owned()),
        vec![
            user_assignment("u-1", "222222222222"),
            AccountAssignment {
                principal_id: "g-1".to_owned(),
                principal_type: PrincipalType::Group,
                account_id: "222222222222".to_owned(),
            },
        ],
    );
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        authority,
        FakePolicyResolver::default(),
        FakeIdentityClient::default(),
        store,
    );

    let records = service
        .collect_permission_sets(&instance())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    let grants = &records[0].grants;
    assert_eq!(grants.len(), 3);
    assert_eq!(grants[0].account_id, "111111111111");
    assert_eq!(grants[1].account_id, "222222222222");
    assert_eq!(grants[1].principal_id, "u-1");
    assert_eq!(grants[2].principal_type, PrincipalType::Group);
}

#[tokio::test]
async fn managed_policy_documents_are_resolved_and_embedded() {
    let mut authority = FakeAuthorityClient::with_page_size(10);
    authority.add_permission_set("ps-1", "Admins");
    authority.attached_policies.insert(
        "ps-1".to_owned(),
        vec![AttachedManagedPolicy {
            policy_id: "policy/ReadOnly".to_owned(),
        }],
    );
    let mut policies = FakePolicyResolver::default();
    policies
        .versions
        .insert("policy/ReadOnly".to_owned(), "v3".to_owned());
    policies.documents.insert(
        ("policy/ReadOnly".to_owned(), "v3".to_owned()),
        json!({"Statement": []}),
    );
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(authority, policies, FakeIdentityClient::default(), store);

    let records = service
        .collect_permission_sets(&instance())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    assert_eq!(records[0].managed_policies.len(), 1);
    assert_eq!(records[0].managed_policies[0].policy_id, "policy/ReadOnly");
    assert_eq!(records[0].managed_policies[0].document, "{\"Statement\":[]}");
}

#[tokio::test]
async fn missing_permission_boundary_is_an_empty_value() {
    let mut authority = FakeAuthorityClient::with_page_size(10);
    authority.add_permission_set("ps-1", "Admins");
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        authority,
        FakePolicyResolver::default(),
        FakeIdentityClient::default(),
        store,
    );

    let records = service
        .collect_permission_sets(&instance())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    assert_eq!(records[0].permission_boundary, "");
}

#[tokio::test]
async fn attached_permission_boundary_is_recorded() {
    let mut authority = FakeAuthorityClient::with_page_size(10);
    authority.add_permission_set("ps-1", "Admins");
    authority.boundaries.insert(
        "ps-1".to_owned(),
        BoundaryLookup::Value("policy/Boundary".to_owned()),
    );
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        authority,
        FakePolicyResolver::default(),
        FakeIdentityClient::default(),
        store,
    );

    let records = service
        .collect_permission_sets(&instance())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    assert_eq!(records[0].permission_boundary, "policy/Boundary");
}

#[tokio::test]
async fn broken_permission_boundary_lookup_aborts_the_run() {
    let mut authority = FakeAuthorityClient::with_page_size(10);
    authority.add_permission_set("ps-1", "Admins");
    authority
        .boundaries
        .insert("ps-1".to_owned(), BoundaryLookup::Broken);
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        authority,
        FakePolicyResolver::default(),
        FakeIdentityClient::default(),
        store.clone(),
    );

    let result = service.collect_permission_sets(&instance()).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(store.permission_sets.lock().await.is_empty());
}

#[tokio::test]
async fn users_are_collected_with_resolved_memberships() {
    let mut identity = FakeIdentityClient {
        page_size: 2,
        ..FakeIdentityClient::default()
    };
    for index in 0..3 {
        identity.users.push(DirectoryUser {
            user_id: format!("u-{index}"),
            user_name: format!("user{index}"),
        });
    }
    identity.memberships.insert(
        "u-0".to_owned(),
        vec!["g-1".to_owned(), "g-2".to_owned(), "g-3".to_owned()],
    );
    identity
        .group_names
        .insert("g-1".to_owned(), "Engineers".to_owned());
    identity
        .group_names
        .insert("g-2".to_owned(), "Operators".to_owned());
    identity
        .group_names
        .insert("g-3".to_owned(), "Auditors".to_owned());
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(
        FakeAuthorityClient::with_page_size(2),
        FakePolicyResolver::default(),
        identity,
        store.clone(),
    );

    let records = service
        .collect_users(&identity_store())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    assert_eq!(records.len(), 3);
    let member_names: Vec<&str> = records[0]
        .memberships
        .iter()
        .map(|membership| membership.group_name.as_str())
        .collect();
    assert_eq!(member_names, vec!["Engineers", "Operators", "Auditors"]);
    assert!(records[1].memberships.is_empty());
    assert_eq!(store.users.lock().await.len(), 3);
}

#[tokio::test]
async fn collection_run_reports_both_counts() {
    let mut authority = FakeAuthorityClient::with_page_size(10);
    authority.add_permission_set("ps-1", "Admins");
    let identity = FakeIdentityClient {
        page_size: 10,
        users: vec![DirectoryUser {
            user_id: "u-1".to_owned(),
            user_name: "alice".to_owned(),
        }],
        ..FakeIdentityClient::default()
    };
    let store = Arc::new(RecordingSnapshotStore::default());
    let service = collector(authority, FakePolicyResolver::default(), identity, store);

    let summary = service
        .run_collection(&instance(), &identity_store())
        .await
        .unwrap_or_else(|error| panic!("collection failed: {error}"));

    assert_eq!(summary.permission_sets, 1);
    assert_eq!(summary.users, 1);
}
