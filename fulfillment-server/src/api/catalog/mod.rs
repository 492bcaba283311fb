//! Catalog API
//!
//! Read-only product lookups with the price checkout would charge right now.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/catalog/products/{id}", get(handler::get_product))
}
