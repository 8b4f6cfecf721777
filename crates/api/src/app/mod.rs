//! HTTP API application wiring (Axum router + engine injection).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and conversion into engine commands
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use foodbank_stock::StockEngine;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router around a shared engine.
pub fn build_app(engine: Arc<StockEngine>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(engine)))
}
