use shared::error::{AppError, ErrorCode};
use shared::order::InvalidTransition;
use thiserror::Error;

use super::carrier::GatewayError;
use crate::db::StorageError;

#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("Order {0} not found")]
    OrderNotFound(String),

    #[error("Order {order_id} cannot be shipped while {status}")]
    NotShippable { order_id: String, status: String },

    #[error("Order {0} has no shipment yet")]
    NotCreated(String),

    #[error("Package attributes must be positive: {}", .0.join(", "))]
    InvalidPackage(Vec<&'static str>),

    #[error("Warehouse id is required")]
    MissingWarehouse,

    #[error("A shipment request for order {0} is already in progress")]
    InProgress(String),

    #[error("Carrier integration is not configured")]
    CarrierNotConfigured,

    #[error("Shipment booking task failed: {0}")]
    BookingTask(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ShipmentError> for AppError {
    fn from(err: ShipmentError) -> Self {
        let message = err.to_string();
        match err {
            ShipmentError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            ShipmentError::NotShippable { order_id, status } => {
                AppError::with_message(ErrorCode::InvalidTransition, message)
                    .with_detail("order_id", order_id)
                    .with_detail("fulfillment_status", status)
            }
            ShipmentError::NotCreated(id) => {
                AppError::with_message(ErrorCode::ShipmentNotCreated, message).with_detail("order_id", id)
            }
            ShipmentError::InvalidPackage(fields) => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message).with_detail("fields", fields)
            }
            ShipmentError::MissingWarehouse => AppError::with_message(ErrorCode::RequiredField, message),
            ShipmentError::InProgress(_) => AppError::conflict(message),
            ShipmentError::CarrierNotConfigured => {
                AppError::with_message(ErrorCode::CarrierNotConfigured, message)
            }
            ShipmentError::BookingTask(_) => AppError::internal(message),
            ShipmentError::InvalidTransition(t) => {
                AppError::with_message(ErrorCode::InvalidTransition, message)
                    .with_detail("machine", t.machine)
                    .with_detail("from", t.from)
                    .with_detail("to", t.to)
            }
            ShipmentError::Gateway(e) => {
                let code = match e {
                    GatewayError::Timeout => ErrorCode::TimeoutError,
                    GatewayError::Network(_) => ErrorCode::NetworkError,
                    GatewayError::Config(_) => ErrorCode::CarrierNotConfigured,
                    _ => ErrorCode::GatewayError,
                };
                let app = AppError::with_message(code, message);
                match e.raw_excerpt() {
                    Some(excerpt) => app.with_detail("raw_excerpt", excerpt),
                    None => app,
                }
            }
            ShipmentError::Storage(e) => e.into(),
        }
    }
}

pub type ShipmentResult<T> = Result<T, ShipmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_keeps_excerpt() {
        let err = ShipmentError::Gateway(GatewayError::NonJson {
            status: 502,
            excerpt: "<html>Bad Gateway</html>".into(),
        });
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::GatewayError);
        assert_eq!(app.details.unwrap()["raw_excerpt"], "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_timeout_maps_to_retryable() {
        let app: AppError = ShipmentError::Gateway(GatewayError::Timeout).into();
        assert_eq!(app.code, ErrorCode::TimeoutError);
        assert_eq!(app.http_status(), http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
