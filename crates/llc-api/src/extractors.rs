//! # Request Helpers
//!
//! Body extraction and register routing shared by the record handlers.

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderMap};
use axum::Json;
use llc_core::RegisterDefinition;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

/// Extract a JSON body, mapping rejection to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<Value>, JsonRejection>) -> Result<..., AppError> {
///     let payload = extract_json(body)?;
/// }
/// ```
pub fn extract_json(result: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// `?resolve=` query parameter, passed through to the register store.
#[derive(Debug, Default, Deserialize)]
pub struct ResolveParams {
    pub resolve: Option<String>,
}

/// The register a request addresses, selected by the first DNS label of
/// the `Host` header, plus the header value itself for building links.
pub fn route<'a>(
    state: &'a AppState,
    headers: &'a HeaderMap,
) -> Result<(&'a RegisterDefinition, &'a str), AppError> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSubdomain)?;
    let register = state
        .registry
        .for_host(host)
        .ok_or(AppError::InvalidSubdomain)?;
    Ok((register, host))
}
