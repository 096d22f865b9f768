//! OpenAI-compatible handler
//! Translates /v1/chat/completions, /v1/completions and /v1/embeddings onto Azure deployments

use axum::{
    body::Body,
    http::{header, HeaderMap, Method},
    response::Response,
};
use serde_json::{json, Value};

use crate::proxy::error::GatewayError;
use crate::proxy::server::AppState;
use crate::proxy::upstream::client::relay_response;
use crate::proxy::upstream::BackendOperation;

/// Forward one OpenAI-shaped request to the Azure deployment of its model.
///
/// `body` is `None` when the request carried no JSON payload. Streaming
/// requests (`"stream": true`) are handed to the paced relay; everything else
/// passes the backend body through untouched.
pub async fn handle_backend(
    state: &AppState,
    operation: BackendOperation,
    method: Method,
    headers: &HeaderMap,
    body: Option<Value>,
) -> Result<Response, GatewayError> {
    let model = body
        .as_ref()
        .and_then(|b| b.get("model"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let stream = body
        .as_ref()
        .and_then(|b| b.get("stream"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let deployment = state
        .routes
        .resolve(&model)
        .ok_or_else(|| GatewayError::MissingModelMapping { model: model.clone() })?;

    tracing::info!(
        "{} request: {} -> {} | Stream: {}",
        operation.as_path(),
        model,
        deployment,
        stream
    );

    let payload = body.unwrap_or_else(|| json!({}));

    let response = state
        .client
        .forward(
            method,
            deployment,
            operation,
            headers.get(header::AUTHORIZATION),
            &payload,
        )
        .await?;

    let status = response.status();
    let upstream_headers = response.headers().clone();

    if !stream {
        return Ok(relay_response(
            status,
            &upstream_headers,
            Body::from_stream(response.bytes_stream()),
        ));
    }

    let frames = state.relay.spawn(response.bytes_stream());
    let mut relayed = relay_response(status, &upstream_headers, Body::from_stream(frames));
    // The relay appends a trailing newline, so the upstream length no longer holds
    relayed.headers_mut().remove(header::CONTENT_LENGTH);
    Ok(relayed)
}
