//! # llc-api: LLC Register Gateway
//!
//! Validating front door for the local land charge registers. Each request
//! is routed to a register by its subdomain, checked against that
//! register's schema and semantic rules, and only then forwarded to the
//! register store.
//!
//! ## Routes
//!
//! - `/health`: liveness text
//! - `/records`, `/record/{id}`: list, read, create, update
//! - `/records/geometry/{function}`: geometry search
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer only; the gateway is not authenticated.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG.
//! - No validation logic in route handlers; it lives in `llc-validation`.
//! - All errors map to `{"errors": [...]}` responses via `AppError`.

pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::records::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "LLC API running"
}
