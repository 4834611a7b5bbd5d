//! JSON-over-HTTP adapter for the authority service.

use async_trait::async_trait;
use grantlens_application::{
    AccountAssignment, AttachedManagedPolicy, AuthorityClient, PermissionSetDescription,
};
use grantlens_core::{AppResult, InstanceId, Page};
use grantlens_domain::{CustomerManagedPolicyRef, PrincipalType};
use serde::{Deserialize, Serialize};

use crate::remote::{RemoteServiceConfig, build_http_client, post_json};

/// Authority service client speaking the JSON wire protocol.
pub struct HttpAuthorityClient {
    http_client: reqwest::Client,
    config: RemoteServiceConfig,
}

impl HttpAuthorityClient {
    /// Creates a client from the endpoint configuration.
    pub fn new(config: RemoteServiceConfig) -> AppResult<Self> {
        Ok(Self {
            http_client: build_http_client(&config)?,
            config,
        })
    }
}

#[derive(Debug, Serialize)]
struct ListPermissionSetsRequest<'a> {
    instance_id: &'a str,
    page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ListPermissionSetsResponse {
    permission_set_ids: Vec<String>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct PermissionSetRequest<'a> {
    instance_id: &'a str,
    permission_set_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DescribePermissionSetResponse {
    name: String,
}

#[derive(Debug, Serialize)]
struct ListAssociatedAccountsRequest<'a> {
    instance_id: &'a str,
    permission_set_id: &'a str,
    page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ListAssociatedAccountsResponse {
    account_ids: Vec<String>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListAccountAssignmentsRequest<'a> {
    instance_id: &'a str,
    permission_set_id: &'a str,
    account_id: &'a str,
    page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AccountAssignmentPayload {
    principal_id: String,
    principal_type: PrincipalType,
    account_id: String,
}

impl From<AccountAssignmentPayload> for AccountAssignment {
    fn from(payload: AccountAssignmentPayload) -> Self {
        Self {
            principal_id: payload.principal_id,
            principal_type: payload.principal_type,
            account_id: payload.account_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListAccountAssignmentsResponse {
    assignments: Vec<AccountAssignmentPayload>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListAttachedManagedPoliciesResponse {
    policy_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GetInlinePolicyResponse {
    inline_policy: String,
}

#[derive(Debug, Deserialize)]
struct ListCustomerManagedPolicyRefsResponse {
    policy_refs: Vec<CustomerManagedPolicyRef>,
}

#[derive(Debug, Deserialize)]
struct GetPermissionBoundaryResponse {
    reference: String,
}

#[async_trait]
impl AuthorityClient for HttpAuthorityClient {
    async fn list_permission_sets(
        &self,
        instance_id: &InstanceId,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>> {
        let response: ListPermissionSetsResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/list",
            &ListPermissionSetsRequest {
                instance_id: instance_id.as_str(),
                page_token,
            },
        )
        .await?;

        Ok(Page::new(response.permission_set_ids, response.next_token))
    }

    async fn describe_permission_set(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<PermissionSetDescription> {
        let response: DescribePermissionSetResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/describe",
            &PermissionSetRequest {
                instance_id: instance_id.as_str(),
                permission_set_id,
            },
        )
        .await?;

        Ok(PermissionSetDescription {
            name: response.name,
        })
    }

    async fn list_associated_accounts(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>> {
        let response: ListAssociatedAccountsResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/accounts/list",
            &ListAssociatedAccountsRequest {
                instance_id: instance_id.as_str(),
                permission_set_id,
                page_token,
            },
        )
        .await?;

        Ok(Page::new(response.account_ids, response.next_token))
    }

    async fn list_account_assignments(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
        account_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<AccountAssignment>> {
        let response: ListAccountAssignmentsResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/assignments/list",
            &ListAccountAssignmentsRequest {
                instance_id: instance_id.as_str(),
                permission_set_id,
                account_id,
                page_token,
            },
        )
        .await?;

        Ok(Page::new(
            response
                .assignments
                .into_iter()
                .map(AccountAssignment::from)
                .collect(),
            response.next_token,
        ))
    }

    async fn list_attached_managed_policies(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<AttachedManagedPolicy>> {
        let response: ListAttachedManagedPoliciesResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/managed-policies/list",
            &PermissionSetRequest {
                instance_id: instance_id.as_str(),
                permission_set_id,
            },
        )
        .await?;

        Ok(response
            .policy_ids
            .into_iter()
            .map(|policy_id| AttachedManagedPolicy { policy_id })
            .collect())
    }

    async fn get_inline_policy(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<String> {
        let response: GetInlinePolicyResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/inline-policy",
            &PermissionSetRequest {
                instance_id: instance_id.as_str(),
                permission_set_id,
            },
        )
        .await?;

        Ok(response.inline_policy)
    }

    async fn list_customer_managed_policy_refs(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<CustomerManagedPolicyRef>> {
        let response: ListCustomerManagedPolicyRefsResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/customer-managed-policy-refs",
            &PermissionSetRequest {
                instance_id: instance_id.as_str(),
                permission_set_id,
            },
        )
        .await?;

        Ok(response.policy_refs)
    }

    async fn get_permission_boundary(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<String> {
        // A permission set without a boundary answers 404, which post_json
        // surfaces as AppError::NotFound for the collector to suppress.
        let response: GetPermissionBoundaryResponse = post_json(
            &self.http_client,
            &self.config,
            "/permission-sets/permission-boundary",
            &PermissionSetRequest {
                instance_id: instance_id.as_str(),
                permission_set_id,
            },
        )
        .await?;

        Ok(response.reference)
    }
}
