//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::order::{FulfillmentStatus, Order, PaymentStatus};

use crate::core::ServerState;
use crate::orders::OrderPage;
use crate::utils::{AppResult, blocking};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFulfillmentStatus {
    pub status: FulfillmentStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatus {
    pub status: PaymentStatus,
}

/// List orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<OrderPage>> {
    let orders = state.orders.clone();
    let page = blocking(move || orders.list_orders(query.limit, query.offset)).await?;
    Ok(Json(page))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let orders = state.orders.clone();
    Ok(Json(blocking(move || orders.get_order(&id)).await?))
}

/// Move fulfillment one legal step; cancelling restocks every line
pub async fn update_fulfillment_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateFulfillmentStatus>,
) -> AppResult<Json<Order>> {
    let orders = state.orders.clone();
    let order = blocking(move || orders.update_fulfillment_status(&id, payload.status)).await?;
    Ok(Json(order))
}

pub async fn update_payment_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePaymentStatus>,
) -> AppResult<Json<Order>> {
    let orders = state.orders.clone();
    let order = blocking(move || orders.update_payment_status(&id, payload.status)).await?;
    Ok(Json(order))
}
