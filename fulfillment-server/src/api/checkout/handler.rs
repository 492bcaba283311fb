use axum::{Json, extract::State, http::StatusCode};
use shared::order::{CheckoutRequest, Order};

use crate::core::ServerState;
use crate::utils::{AppResult, blocking};

/// Place an order
///
/// Returns 201 with the persisted order. Any failure leaves stock, payment
/// references and the outbox untouched.
pub async fn checkout(
    State(state): State<ServerState>,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let ledger = state.ledger.clone();
    let order = blocking(move || ledger.checkout(&req)).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
