use axum::Router;

pub mod stock;
pub mod system;

/// Router for all engine-backed endpoints.
pub fn router() -> Router {
    Router::new().nest("/stock", stock::router())
}
