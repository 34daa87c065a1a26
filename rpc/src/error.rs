//! RPC error types and their JSON rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use pmp_service::ServiceError;

#[derive(Debug, Error)]
pub enum RpcError {
    /// Rendered as `{"error": ...}` with the service error's status.
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    /// Rendered as `{"ok": false, "message": ...}`.
    #[error("{message}")]
    Refusal { status: StatusCode, message: String },

    /// Rendered as `{"ok": false, "error": ...}` with status 400.
    #[error("{0}")]
    BrowseRefusal(String),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Re-shape a client-side service error as an `{ok, message}` refusal.
    /// Server-side errors keep the generic shape.
    pub fn into_refusal(self) -> Self {
        match self {
            RpcError::Service(e) if e.status_code() < 500 => RpcError::Refusal {
                status: StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST),
                message: e.public_message(),
            },
            other => other,
        }
    }

    pub fn into_browse_refusal(self) -> Self {
        match self {
            RpcError::Service(e) if e.status_code() < 500 => {
                RpcError::BrowseRefusal(e.public_message())
            }
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Service(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            RpcError::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcError::BadRequest(_) | RpcError::BrowseRefusal(_) => StatusCode::BAD_REQUEST,
            RpcError::Refusal { status, .. } => *status,
            RpcError::Join(_) | RpcError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            RpcError::Service(e) => json!({ "error": e.public_message() }),
            RpcError::Refusal { message, .. } => json!({ "ok": false, "message": message }),
            RpcError::BrowseRefusal(message) => json!({ "ok": false, "error": message }),
            RpcError::Unauthorized | RpcError::BadRequest(_) => json!({ "error": self.to_string() }),
            RpcError::Join(_) | RpcError::Io(_) => json!({ "error": "Internal server error" }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusal_keeps_client_status() {
        let e = RpcError::from(ServiceError::RateLimited("slow down".into())).into_refusal();
        assert_eq!(e.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(matches!(e, RpcError::Refusal { ref message, .. } if message == "slow down"));
    }

    #[test]
    fn server_errors_stay_generic() {
        let e = RpcError::from(ServiceError::Storage("disk".into())).into_refusal();
        assert!(matches!(e, RpcError::Service(_)));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn browse_refusal_is_bad_request() {
        let e = RpcError::from(ServiceError::Validation("Invalid or unknown ticket.".into()))
            .into_browse_refusal();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }
}
