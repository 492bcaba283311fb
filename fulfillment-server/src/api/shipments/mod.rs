//! Shipment API Module (admin)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/admin/orders/{id}/shipment", post(handler::create_shipment))
        .route(
            "/api/admin/orders/{id}/shipment/reset",
            post(handler::reset_shipment),
        )
        .route(
            "/api/admin/orders/{id}/shipment-attempts",
            get(handler::list_attempts),
        )
        .route(
            "/api/admin/orders/{id}/tracking/refresh",
            post(handler::refresh_tracking),
        )
        .route("/api/admin/warehouses", get(handler::list_warehouses))
        .route(
            "/api/admin/carrier/unrecognized-statuses",
            get(handler::list_unrecognized_statuses),
        )
}
