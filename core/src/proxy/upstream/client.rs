//! Upstream client for calling Azure OpenAI deployments

use axum::body::Body;
use axum::response::Response;
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;
use tokio::time::Duration;

use crate::proxy::error::GatewayError;

/// Azure uses its own key header instead of `Authorization`
pub const API_KEY_HEADER: &str = "api-key";

/// Deployment operation a client path maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOperation {
    ChatCompletions,
    Completions,
    Embeddings,
}

impl BackendOperation {
    pub fn as_path(&self) -> &'static str {
        match self {
            BackendOperation::ChatCompletions => "chat/completions",
            BackendOperation::Completions => "completions",
            BackendOperation::Embeddings => "embeddings",
        }
    }
}

#[derive(Clone)]
pub struct AzureClient {
    http_client: Client,
    base_url: String,
    api_version: String,
}

impl AzureClient {
    pub fn new(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        request_timeout: u64,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(request_timeout))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_version: api_version.into(),
        })
    }

    pub fn build_url(base_url: &str, deployment: &str, operation: BackendOperation, api_version: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            base_url,
            deployment,
            operation.as_path(),
            api_version
        )
    }

    pub fn deployment_url(&self, deployment: &str, operation: BackendOperation) -> String {
        Self::build_url(&self.base_url, deployment, operation, &self.api_version)
    }

    /// Forward a translated request to the deployment.
    ///
    /// Fails with `MissingAuthorization` before any network activity when the
    /// inbound credential is absent or empty, and with `Upstream` on transport errors.
    pub async fn forward(
        &self,
        method: Method,
        deployment: &str,
        operation: BackendOperation,
        authorization: Option<&header::HeaderValue>,
        body: &Value,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = self.deployment_url(deployment, operation);

        // An empty credential counts as no credential
        let authorization = authorization
            .filter(|v| !v.is_empty())
            .ok_or(GatewayError::MissingAuthorization)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(API_KEY_HEADER, strip_bearer(authorization));

        let payload = serde_json::to_vec(body).map_err(|e| GatewayError::Upstream(e.to_string()))?;

        tracing::debug!("Forwarding {} {}", method, url);

        self.http_client
            .request(method, &url)
            .headers(headers)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Upstream request to {} failed: {}", url, e);
                GatewayError::Upstream(e.to_string())
            })
    }
}

/// Remove a literal leading `Bearer ` from an Authorization value
pub fn strip_bearer(value: &header::HeaderValue) -> header::HeaderValue {
    match value.as_bytes().strip_prefix(b"Bearer ") {
        // A suffix of a valid header value is itself valid
        Some(rest) => header::HeaderValue::from_bytes(rest).unwrap_or_else(|_| value.clone()),
        None => value.clone(),
    }
}

/// Copy headers from the upstream response, dropping hop-by-hop ones
pub fn preserve_response_headers(upstream: &header::HeaderMap) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    for (name, value) in upstream.iter() {
        if should_forward_header(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

fn should_forward_header(name: &str) -> bool {
    !(name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("keep-alive")
        || name.eq_ignore_ascii_case("proxy-authenticate")
        || name.eq_ignore_ascii_case("proxy-authorization")
        || name.eq_ignore_ascii_case("te")
        || name.eq_ignore_ascii_case("trailers")
        || name.eq_ignore_ascii_case("transfer-encoding")
        || name.eq_ignore_ascii_case("upgrade"))
}

/// Build the client response from upstream status and headers around `body`,
/// adding an open CORS origin
pub fn relay_response(status: StatusCode, upstream_headers: &header::HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = preserve_response_headers(upstream_headers);
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );
    response
}
