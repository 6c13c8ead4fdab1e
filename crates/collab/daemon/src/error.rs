//! Error types for collab-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use collab_storage::StorageError;
use collab_types::CollabError;
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Workflow refused or failed the call
    #[error(transparent)]
    Collab(#[from] CollabError),

    /// The request did not identify the calling admin
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Collab(err) => match err {
                CollabError::InvalidTransition(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
                CollabError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                CollabError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CollabError::PreconditionFailed { .. } => {
                    (StatusCode::PRECONDITION_FAILED, "PRECONDITION_FAILED")
                }
                CollabError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
                }
                CollabError::Persistence(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_UNAVAILABLE")
                }
            },
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Collab(err) => err
                .rejection()
                .and_then(|rejection| serde_json::to_value(rejection).ok()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request refused");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;
    use collab_types::{
        AdminId, CollaborationId, CollaborationStatus, Guard, ProgramId, TransitionRejection,
        WorkflowEvent,
    };

    fn rejection() -> TransitionRejection {
        TransitionRejection {
            program_id: ProgramId::new("p1"),
            collaboration_id: Some(CollaborationId::new("c1")),
            event: WorkflowEvent::Accept,
            guard: Guard::RowNotPending {
                found: CollaborationStatus::Accepted,
            },
        }
    }

    fn status(err: CollabError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(status(rejection().into()), StatusCode::CONFLICT);
        assert_eq!(
            status(CollabError::forbidden(&AdminId::new("eve"), "accept", "not the invitee")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(CollabError::not_found("program", "p9")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(CollabError::PreconditionFailed {
                program_id: ProgramId::new("p1"),
                reason: "moved".to_string(),
                rejection: None,
            }),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            status(CollabError::Validation("empty title".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(CollabError::Persistence("down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Unauthenticated("missing header".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_rejection_is_carried_in_details() {
        let details = ApiError::from(CollabError::from(rejection()))
            .details()
            .unwrap();
        assert_eq!(details["guard"], "row_not_pending");
        assert_eq!(details["found"], "accepted");
        assert_eq!(details["collaboration_id"], "c1");
    }
}
