//! JSON-over-HTTP adapter for the identity service.

use async_trait::async_trait;
use grantlens_application::{DirectoryUser, IdentityDirectoryClient};
use grantlens_core::{AppResult, IdentityStoreId, Page};
use serde::{Deserialize, Serialize};

use crate::remote::{RemoteServiceConfig, build_http_client, post_json};

/// Identity service client speaking the JSON wire protocol.
pub struct HttpIdentityClient {
    http_client: reqwest::Client,
    config: RemoteServiceConfig,
}

impl HttpIdentityClient {
    /// Creates a client from the endpoint configuration.
    pub fn new(config: RemoteServiceConfig) -> AppResult<Self> {
        Ok(Self {
            http_client: build_http_client(&config)?,
            config,
        })
    }
}

#[derive(Debug, Serialize)]
struct ListUsersRequest<'a> {
    identity_store_id: &'a str,
    page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    user_id: String,
    user_name: String,
}

impl From<UserPayload> for DirectoryUser {
    fn from(payload: UserPayload) -> Self {
        Self {
            user_id: payload.user_id,
            user_name: payload.user_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListUsersResponse {
    users: Vec<UserPayload>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListGroupMembershipsRequest<'a> {
    identity_store_id: &'a str,
    user_id: &'a str,
    page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ListGroupMembershipsResponse {
    group_ids: Vec<String>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct DescribeGroupRequest<'a> {
    identity_store_id: &'a str,
    group_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DescribeGroupResponse {
    display_name: String,
}

#[async_trait]
impl IdentityDirectoryClient for HttpIdentityClient {
    async fn list_users(
        &self,
        identity_store_id: &IdentityStoreId,
        page_token: Option<&str>,
    ) -> AppResult<Page<DirectoryUser>> {
        let response: ListUsersResponse = post_json(
            &self.http_client,
            &self.config,
            "/users/list",
            &ListUsersRequest {
                identity_store_id: identity_store_id.as_str(),
                page_token,
            },
        )
        .await?;

        Ok(Page::new(
            response.users.into_iter().map(DirectoryUser::from).collect(),
            response.next_token,
        ))
    }

    async fn list_group_memberships(
        &self,
        identity_store_id: &IdentityStoreId,
        user_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>> {
        let response: ListGroupMembershipsResponse = post_json(
            &self.http_client,
            &self.config,
            "/group-memberships/list",
            &ListGroupMembershipsRequest {
                identity_store_id: identity_store_id.as_str(),
                user_id,
                page_token,
            },
        )
        .await?;

        Ok(Page::new(response.group_ids, response.next_token))
    }

    async fn describe_group(
        &self,
        identity_store_id: &IdentityStoreId,
        group_id: &str,
    ) -> AppResult<String> {
        let response: DescribeGroupResponse = post_json(
            &self.http_client,
            &self.config,
            "/groups/describe",
            &DescribeGroupRequest {
                identity_store_id: identity_store_id.as_str(),
                group_id,
            },
        )
        .await?;

        Ok(response.display_name)
    }
}
