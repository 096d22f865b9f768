//! Request dispatch
//! Picks a responder for each inbound request from its method and path

use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::proxy::error::GatewayError;
use crate::proxy::handlers::{info, openai};
use crate::proxy::server::AppState;
use crate::proxy::upstream::BackendOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Models,
    Moderations,
    Backend(BackendOperation),
    Unknown,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path {
            "/v1/chat/completions" => Route::Backend(BackendOperation::ChatCompletions),
            "/v1/completions" => Route::Backend(BackendOperation::Completions),
            "/v1/embeddings" => Route::Backend(BackendOperation::Embeddings),
            "/v1/models" => Route::Models,
            "/v1/moderations" => Route::Moderations,
            _ => Route::Unknown,
        }
    }
}

/// Collapse a doubled leading `/` (`//v1/...`) into one. Nothing else is rewritten.
pub fn normalize_path(path: &str) -> &str {
    if path.starts_with("//") {
        &path[1..]
    } else {
        path
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Entry point for every inbound request
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    if request.method() == Method::OPTIONS {
        return info::preflight();
    }

    let route = Route::from_path(normalize_path(request.uri().path()));

    match route {
        Route::Models => info::list_models(&state.routes),
        Route::Moderations => info::moderation(),
        Route::Backend(operation) => match forward(&state, operation, request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        },
        Route::Unknown => {
            tracing::debug!("No route for {} {}", request.method(), request.uri().path());
            GatewayError::NotFound.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    operation: BackendOperation,
    request: Request,
) -> Result<Response, GatewayError> {
    let method = request.method().clone();
    let headers = request.headers().clone();

    let payload = if carries_body(&method) {
        read_json(request).await?
    } else {
        None
    };

    openai::handle_backend(state, operation, method, &headers, payload).await
}

/// Parse the request body as JSON; an empty body counts as no body.
///
/// Buffering goes through the `Bytes` extractor so the router's
/// `DefaultBodyLimit` applies.
async fn read_json(request: Request) -> Result<Option<Value>, GatewayError> {
    let bytes = Bytes::from_request(request, &()).await.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge
        } else {
            GatewayError::InvalidBody(rejection.body_text())
        }
    })?;

    if bytes.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| GatewayError::InvalidBody(e.to_string()))
}
