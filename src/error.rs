//! Tagged failures shared by every room transition and surfaced over HTTP.
//!
//! Transitions never panic and never use exception-style control flow: each
//! one returns `Result<_, RoomError>` and the caller branches on the tag.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure category, mapped 1:1 onto an HTTP status by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    BadRequest,
    /// Missing or wrong host token.
    Unauthorised,
    /// Known actor, denied operation (wrong caller, policy denial).
    Forbidden,
    /// Unknown room, participant, round, or submission.
    NotFound,
    /// Valid request that the current state refuses.
    Conflict,
    /// The room stopped accepting this operation permanently.
    Gone,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorised => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Gone => StatusCode::GONE,
        }
    }
}

/// A rejected command: the state is left untouched and the caller receives
/// the kind plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RoomError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RoomError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorised(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorised, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn gone(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Gone, message)
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        (self.kind.status(), Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<JsonRejection> for RoomError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
