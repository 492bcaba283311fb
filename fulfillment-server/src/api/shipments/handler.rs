//! Shipment API Handlers
//!
//! Carrier calls are async; everything else is a short redb transaction.

use axum::{
    Json,
    extract::{Path, State},
};
use shared::order::Order;
use shared::shipment::{
    CreateShipmentRequest, ShipmentAttempt, TrackingUpdate, UnrecognizedStatus, Warehouse,
};

use crate::core::ServerState;
use crate::utils::{AppResult, blocking};

/// Book a shipment with the carrier
///
/// Carrier failures come back as 502/503 with the raw excerpt in `details`;
/// the order is left with shipment status `FAILED`.
pub async fn create_shipment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<CreateShipmentRequest>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.shipments.create_shipment(&id, &req).await?))
}

/// FAILED → PENDING
pub async fn reset_shipment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let shipments = state.shipments.clone();
    Ok(Json(blocking(move || shipments.reset_shipment(&id)).await?))
}

pub async fn list_attempts(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<ShipmentAttempt>>> {
    let shipments = state.shipments.clone();
    Ok(Json(blocking(move || shipments.list_attempts(&id)).await?))
}

pub async fn refresh_tracking(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<TrackingUpdate>> {
    Ok(Json(state.shipments.refresh_tracking(&id).await?))
}

pub async fn list_warehouses(State(state): State<ServerState>) -> AppResult<Json<Vec<Warehouse>>> {
    Ok(Json(state.shipments.list_warehouses().await?))
}

/// Carrier status texts the normalizer did not recognize, most frequent first
pub async fn list_unrecognized_statuses(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<UnrecognizedStatus>>> {
    let storage = state.storage.clone();
    Ok(Json(blocking(move || storage.list_unrecognized_statuses()).await?))
}
