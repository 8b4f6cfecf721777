use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use foodbank_core::{AssociationId, Clock, DomainError, LotId, ProductId};
use foodbank_stock::StockEngine;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/lots", post(add_stock))
        .route("/lots/:id", get(get_lot))
        .route("/remove", post(remove_from_stock))
        .route("/availability", get(check_availability))
        .route("/expiring", get(get_expiring_products))
        .route("/critical", get(get_critical_stock_products))
        .route("/movements", get(get_movements))
        .route("/expire", post(mark_expired_products))
}

pub async fn add_stock(
    Extension(engine): Extension<Arc<StockEngine>>,
    Json(body): Json<dto::AddStockRequest>,
) -> axum::response::Response {
    let cmd = match body.into_command() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.add_stock(cmd) {
        Ok(lot) => (StatusCode::CREATED, Json(lot)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn get_lot(
    Extension(engine): Extension<Arc<StockEngine>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let lot_id: LotId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid lot id"),
    };

    match engine.get_lot(lot_id) {
        Ok(Some(lot)) => (StatusCode::OK, Json(lot)).into_response(),
        Ok(None) => errors::domain_error_to_response(DomainError::not_found()),
        Err(e) => errors::stock_error_to_response(e),
    }
}

/// Partial allocations are still `200 OK`; the body's `success` flag tells them apart.
pub async fn remove_from_stock(
    Extension(engine): Extension<Arc<StockEngine>>,
    Json(body): Json<dto::RemoveStockRequest>,
) -> axum::response::Response {
    let cmd = match body.into_command() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.remove_from_stock(cmd) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn check_availability(
    Extension(engine): Extension<Arc<StockEngine>>,
    Query(q): Query<dto::AvailabilityQuery>,
) -> axum::response::Response {
    let (product_id, association_id) =
        match (ProductId::new(q.product_id), AssociationId::new(q.association_id)) {
            (Ok(p), Ok(a)) => (p, a),
            (Err(e), _) | (_, Err(e)) => return errors::domain_error_to_response(e),
        };

    match engine.check_availability(&product_id, &association_id) {
        Ok(quantity) => Json(serde_json::json!({
            "product_id": product_id,
            "association_id": association_id,
            "quantity": quantity,
        }))
        .into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn get_expiring_products(
    Extension(engine): Extension<Arc<StockEngine>>,
    Query(q): Query<dto::ExpiringQuery>,
) -> axum::response::Response {
    let association_id = match AssociationId::new(q.association_id) {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.get_expiring_products(&association_id, q.days) {
        Ok(lots) => Json(lots).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn get_critical_stock_products(
    Extension(engine): Extension<Arc<StockEngine>>,
    Query(q): Query<dto::CriticalQuery>,
) -> axum::response::Response {
    let association_id = match AssociationId::new(q.association_id) {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.get_critical_stock_products(&association_id, q.threshold) {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn get_movements(
    Extension(engine): Extension<Arc<StockEngine>>,
    Query(q): Query<dto::MovementsQuery>,
) -> axum::response::Response {
    let filters = dto::optional_association(q.association_id)
        .and_then(|a| Ok((a, dto::optional_product(q.product_id)?)));
    let (association_id, product_id) = match filters {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match engine.get_movements(association_id.as_ref(), product_id.as_ref()) {
        Ok(movements) => Json(movements).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn mark_expired_products(
    Extension(engine): Extension<Arc<StockEngine>>,
) -> axum::response::Response {
    let now = engine.clock().now();
    match engine.mark_expired_products(now) {
        Ok(count) => Json(serde_json::json!({ "expired": count, "at": now })).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
