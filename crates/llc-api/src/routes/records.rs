//! # Record Routes
//!
//! Routes (register selected by the first label of `Host`):
//! - GET  /records - List records
//! - GET  /record/{id} - Get one record
//! - POST /records - Validate and create a record
//! - PUT  /record/{id} - Validate and replace a record
//! - POST /records/geometry/{function} - Geometry search (geometry registers only)
//!
//! Writes pass through the validation pipeline before anything reaches the
//! register store. Successful responses are written with sorted keys.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use llc_core::canonical::to_canonical_string;
use llc_core::RegisterDefinition;
use llc_register_client::BackendReply;
use llc_validation::RequestContext;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extractors::{extract_json, route, ResolveParams};
use crate::state::AppState;

/// Build the record router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .route("/record/:id", get(get_record).put(update_record))
        .route("/records/geometry/:function", post(geometry_search))
}

/// GET /records
async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ResolveParams>,
) -> Result<Response, AppError> {
    let (def, _) = route(&state, &headers)?;
    let reply = state
        .client
        .list_records(def.path(), params.resolve.as_deref())
        .await?;
    echo(reply)
}

/// GET /record/:id
async fn get_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<ResolveParams>,
) -> Result<Response, AppError> {
    let (def, _) = route(&state, &headers)?;
    let reply = state
        .client
        .get_record(def.path(), &id, params.resolve.as_deref())
        .await?;
    echo(reply)
}

/// POST /records
async fn create_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ResolveParams>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let (def, host) = route(&state, &headers)?;
    let mut payload = extract_json(body)?;
    validate(&state, RequestContext::create(def), &mut payload).await?;

    let reply = state
        .client
        .create_record(def.path(), &payload, params.resolve.as_deref())
        .await?;
    tracing::info!(register = %def.name, status = reply.status, "record created");
    write_response(host, def, reply)
}

/// PUT /record/:id
async fn update_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<ResolveParams>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let (def, host) = route(&state, &headers)?;
    let mut payload = extract_json(body)?;
    validate(&state, RequestContext::update(def, &id), &mut payload).await?;

    let reply = state
        .client
        .update_record(def.path(), &id, &payload, params.resolve.as_deref())
        .await?;
    tracing::info!(register = %def.name, id = %id, status = reply.status, "record updated");
    write_response(host, def, reply)
}

/// POST /records/geometry/:function
async fn geometry_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(function): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let (def, _) = route(&state, &headers)?;
    if !def.geometry_search {
        return Err(AppError::InvalidSubdomain);
    }
    let mut criteria = extract_json(body)?;
    validate(&state, RequestContext::search(def), &mut criteria).await?;

    let reply = state
        .client
        .geometry_search(def.path(), &function, &criteria)
        .await?;
    echo(reply)
}

async fn validate(
    state: &AppState,
    ctx: RequestContext<'_>,
    payload: &mut Value,
) -> Result<(), AppError> {
    let outcome = state.pipeline().validate(ctx, payload).await?;
    if outcome.is_valid() {
        Ok(())
    } else {
        tracing::debug!(
            register = %ctx.register.name,
            operation = ?ctx.operation,
            errors = outcome.errors.len(),
            "request rejected"
        );
        Err(AppError::Validation(outcome.errors))
    }
}

/// Relay a read or search reply unchanged apart from key order.
fn echo(reply: BackendReply) -> Result<Response, AppError> {
    json_response(reply.status, &reply.body)
}

/// Wrap a write reply with a link to the stored record.
fn write_response(
    host: &str,
    def: &RegisterDefinition,
    reply: BackendReply,
) -> Result<Response, AppError> {
    let pk = match reply.body.get(&def.primary_id) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            return Err(AppError::Internal(format!(
                "register store reply for '{}' has no '{}'",
                def.name, def.primary_id
            )))
        }
        Some(other) => other.to_string(),
    };
    let body = json!({
        "href": format!("{host}/record/{pk}"),
        "record": reply.body,
    });
    json_response(reply.status, &body)
}

fn json_response(status: u16, body: &Value) -> Result<Response, AppError> {
    let status = StatusCode::from_u16(status)
        .map_err(|e| AppError::Internal(format!("register store status {status}: {e}")))?;
    let text = to_canonical_string(body)?;
    Ok((status, [(header::CONTENT_TYPE, "application/json")], text).into_response())
}
