//! Gateway error types and response handling

use axum::{
    body::Body,
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use thiserror::Error;

/// Errors that end a request before (or instead of) a backend response
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("404 Not Found")]
    NotFound,

    #[error("Not allowed")]
    MissingAuthorization,

    #[error("Missing model mapper for model '{model}'")]
    MissingModelMapping { model: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("An error occurred when processing your request, please try again later. Error: {0}")]
    Upstream(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MissingAuthorization | GatewayError::MissingModelMapping { .. } => {
                StatusCode::FORBIDDEN
            }
            GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response<Body> {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Gateway error: {} - {}", status, message);
        } else {
            tracing::warn!("Request rejected: {} - {}", status, message);
        }

        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Body::from(message))
            .unwrap_or_else(|_| Response::new(Body::from("Internal error building error response")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GatewayError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(GatewayError::MissingAuthorization.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            GatewayError::MissingModelMapping { model: "gpt-4".into() }.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(GatewayError::InvalidBody("eof".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            GatewayError::Upstream("dns".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_message_embeds_cause() {
        let err = GatewayError::Upstream("connection refused".into());
        assert!(err.to_string().ends_with("Error: connection refused"));
    }
}
