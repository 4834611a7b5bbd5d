//! Shared plumbing for the JSON-over-HTTP service adapters.

use std::time::Duration;

use grantlens_core::{AppError, AppResult};
use reqwest::StatusCode;
use reqwest::header;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Header carrying the region the remote service is deployed in.
pub(crate) const REGION_HEADER: &str = "x-grantlens-region";

/// Connection settings for one remote service endpoint.
#[derive(Debug, Clone)]
pub struct RemoteServiceConfig {
    /// Base URL of the service API, without a trailing slash.
    pub base_url: String,
    /// Region the service is deployed in.
    pub region: String,
    /// Bearer token used to authenticate calls.
    pub api_token: String,
    /// Request timeout applied to every call.
    pub timeout: Duration,
}

pub(crate) fn build_http_client(config: &RemoteServiceConfig) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))
}

/// Posts a JSON request and decodes the JSON response.
///
/// Status mapping: 404 becomes [`AppError::NotFound`], 401/403 become
/// [`AppError::Unauthorized`], any other non-2xx becomes
/// [`AppError::Internal`] carrying status and body.
pub(crate) async fn post_json<Request, Response>(
    http_client: &reqwest::Client,
    config: &RemoteServiceConfig,
    path: &str,
    request: &Request,
) -> AppResult<Response>
where
    Request: Serialize + Sync,
    Response: DeserializeOwned,
{
    let endpoint = format!("{}{path}", config.base_url);
    let response = http_client
        .post(endpoint)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", config.api_token),
        )
        .header(REGION_HEADER, config.region.as_str())
        .json(request)
        .send()
        .await
        .map_err(|error| AppError::Internal(format!("failed to call {path}: {error}")))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!(
            "{path} reported no such resource"
        )));
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AppError::Unauthorized(format!(
            "{path} rejected the caller"
        )));
    }
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        return Err(AppError::Internal(format!(
            "{path} returned status {}: {body}",
            status.as_u16()
        )));
    }

    response.json::<Response>().await.map_err(|error| {
        AppError::Internal(format!("failed to parse {path} response body: {error}"))
    })
}
