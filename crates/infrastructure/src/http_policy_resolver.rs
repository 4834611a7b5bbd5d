//! JSON-over-HTTP adapter for the policy resolution service.

use async_trait::async_trait;
use grantlens_application::PolicyResolver;
use grantlens_core::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::remote::{RemoteServiceConfig, build_http_client, post_json};

/// Policy resolution client speaking the JSON wire protocol.
pub struct HttpPolicyResolver {
    http_client: reqwest::Client,
    config: RemoteServiceConfig,
}

impl HttpPolicyResolver {
    /// Creates a client from the endpoint configuration.
    pub fn new(config: RemoteServiceConfig) -> AppResult<Self> {
        Ok(Self {
            http_client: build_http_client(&config)?,
            config,
        })
    }
}

#[derive(Debug, Serialize)]
struct GetPolicyRequest<'a> {
    policy_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetPolicyResponse {
    default_version_id: String,
}

#[derive(Debug, Serialize)]
struct GetPolicyVersionRequest<'a> {
    policy_id: &'a str,
    version_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetPolicyVersionResponse {
    document: Value,
}

#[async_trait]
impl PolicyResolver for HttpPolicyResolver {
    async fn default_policy_version(&self, policy_id: &str) -> AppResult<String> {
        let response: GetPolicyResponse = post_json(
            &self.http_client,
            &self.config,
            "/policies/describe",
            &GetPolicyRequest { policy_id },
        )
        .await?;

        Ok(response.default_version_id)
    }

    async fn policy_document(&self, policy_id: &str, version_id: &str) -> AppResult<Value> {
        let response: GetPolicyVersionResponse = post_json(
            &self.http_client,
            &self.config,
            "/policies/version",
            &GetPolicyVersionRequest {
                policy_id,
                version_id,
            },
        )
        .await?;

        Ok(response.document)
    }
}
