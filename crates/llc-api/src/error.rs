//! # Application Error
//!
//! Every error response has the same body shape:
//!
//! ```json
//! {"errors": ["...", "..."]}
//! ```
//!
//! Register store errors are relayed with the store's status and body text,
//! except HTML error pages, which become a generic 500. Internal details
//! are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use llc_core::CanonicalizationError;
use llc_register_client::RegisterApiError;
use llc_validation::Fault;
use thiserror::Error;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// The Host header names no register, or the register lacks the
    /// requested capability (400).
    #[error("invalid sub-domain")]
    InvalidSubdomain,

    /// Structural or semantic validation failed (400).
    #[error("validation failed with {} error(s)", .0.len())]
    Validation(Vec<String>),

    /// Request body is not JSON (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The register store answered non-2xx; relayed with its status.
    #[error("register store returned {status}: {body}")]
    Backend { status: u16, body: String },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and the client-facing messages.
    fn status_and_errors(&self) -> (StatusCode, Vec<String>) {
        match self {
            Self::InvalidSubdomain => (StatusCode::BAD_REQUEST, vec![self.to_string()]),
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, errors.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, vec![msg.clone()]),
            Self::Backend { status, body } => match StatusCode::from_u16(*status) {
                Ok(code) => (code, vec![body.clone()]),
                Err(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![INTERNAL_MESSAGE.to_string()],
                ),
            },
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                vec![INTERNAL_MESSAGE.to_string()],
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, errors) = self.status_and_errors();

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Backend { .. } => tracing::warn!(error = %self, "relaying register store error"),
            _ => {}
        }

        (status, Json(serde_json::json!({ "errors": errors }))).into_response()
    }
}

/// An upstream crash page rather than a structured error.
fn is_html(body: &str) -> bool {
    body.trim_start()
        .get(..14)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!DOCTYPE HTML"))
}

impl From<RegisterApiError> for AppError {
    fn from(err: RegisterApiError) -> Self {
        match err {
            RegisterApiError::ApiError { endpoint, status, body } => {
                if is_html(&body) {
                    Self::Internal(format!("{endpoint} returned an HTML error page ({status})"))
                } else {
                    Self::Backend { status, body }
                }
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<Fault> for AppError {
    fn from(err: Fault) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<CanonicalizationError> for AppError {
    fn from(err: CanonicalizationError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llc_core::SourceError;

    #[test]
    fn invalid_subdomain_is_400() {
        let (status, errors) = AppError::InvalidSubdomain.status_and_errors();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors, vec!["invalid sub-domain"]);
    }

    #[test]
    fn validation_keeps_every_message() {
        let err = AppError::Validation(vec!["a".into(), "b".into()]);
        let (status, errors) = err.status_and_errors();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors, vec!["a", "b"]);
    }

    #[test]
    fn backend_status_is_relayed() {
        let err = AppError::from(RegisterApiError::ApiError {
            endpoint: "GET /x/record/1".into(),
            status: 404,
            body: "Record not found".into(),
        });
        let (status, errors) = err.status_and_errors();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(errors, vec!["Record not found"]);
    }

    #[test]
    fn html_body_becomes_internal() {
        let err = AppError::from(RegisterApiError::ApiError {
            endpoint: "POST /x/records".into(),
            status: 502,
            body: "  <!doctype html><html><body>Bad Gateway</body></html>".into(),
        });
        assert!(matches!(err, AppError::Internal(_)));
        let (status, errors) = err.status_and_errors();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(errors, vec![INTERNAL_MESSAGE]);
    }

    #[test]
    fn short_bodies_are_not_html() {
        assert!(!is_html("<!DOC"));
        assert!(!is_html(""));
        assert!(is_html("<!DOCTYPE HTML PUBLIC"));
    }

    #[test]
    fn internal_never_leaks_detail() {
        let err = AppError::from(Fault::Source(SourceError::Unavailable("connection refused".into())));
        let (_, errors) = err.status_and_errors();
        assert_eq!(errors, vec![INTERNAL_MESSAGE]);
    }
}
