//! Locally answered endpoints
//! Preflight, /v1/models and the /v1/moderations stub never reach Azure

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

use crate::proxy::RouteTable;

/// Answer any OPTIONS request with open CORS headers
pub fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
        Body::empty(),
    )
        .into_response()
}

/// Handle /v1/models
///
/// Lists every configured model id in configuration order, whether or not a
/// deployment is set for it.
pub fn list_models(routes: &RouteTable) -> Response {
    let models: Vec<Value> = routes.models().map(model_object).collect();

    pretty_json(&json!({
        "object": "list",
        "data": models
    }))
}

fn model_object(id: &str) -> Value {
    json!({
        "id": id,
        "object": "model",
        "created": 1677610602,
        "owned_by": "openai",
        "permission": [{
            "id": "modelperm-M56FXnG1AsIr3SXq8BYPvXJA",
            "object": "model_permission",
            "created": 1679602088,
            "allow_create_engine": false,
            "allow_sampling": true,
            "allow_logprobs": true,
            "allow_search_indices": false,
            "allow_view": true,
            "allow_fine_tuning": false,
            "organization": "*",
            "group": null,
            "is_blocking": false
        }],
        "root": id,
        "parent": null
    })
}

/// Handle /v1/moderations with a fixed "not flagged" result
pub fn moderation() -> Response {
    pretty_json(&json!({
        "id": "modr-placeholder",
        "model": "text-moderation-001",
        "results": [{"flagged": false}]
    }))
}

fn pretty_json(value: &Value) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )
        .into_response()
}
