//! Order API Module
//!
//! Customers read their own order by id; admins list orders and move them
//! through the fulfillment and payment machines.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route("/api/admin/orders", get(handler::list))
        .route(
            "/api/admin/orders/{id}/fulfillment-status",
            put(handler::update_fulfillment_status),
        )
        .route(
            "/api/admin/orders/{id}/payment-status",
            put(handler::update_payment_status),
        )
}
