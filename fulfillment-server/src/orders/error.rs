use shared::error::{AppError, ErrorCode};
use shared::order::InvalidTransition;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::db::StorageError;
use crate::inventory::InventoryError;

use super::payment_guard::PaymentReferenceError;

/// Order errors
///
/// Checkout failures carry a customer-facing message naming the product or
/// variant; they abort the whole attempt before anything is committed.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    EmptyOrder,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: u32 },

    #[error("Missing customer fields: {}", .0.join(", "))]
    MissingCustomerFields(Vec<&'static str>),

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Variant {} not found for {product_name}", .variant.as_deref().unwrap_or("(none)"))]
    VariantNotFound {
        product_id: String,
        product_name: String,
        variant: Option<String>,
    },

    #[error("Only {available} left of {name}, {requested} requested")]
    InsufficientStock {
        product_id: String,
        name: String,
        variant: Option<String>,
        requested: u32,
        available: u32,
    },

    #[error("Prepaid orders require a payment reference")]
    PaymentReferenceRequired,

    #[error(transparent)]
    PaymentReference(#[from] PaymentReferenceError),

    #[error("Order {0} not found")]
    OrderNotFound(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for OrderError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound(id) => OrderError::ProductNotFound(id),
            CatalogError::Storage(e) => OrderError::Storage(e),
            CatalogError::InvalidSeed(msg) => OrderError::Internal(msg),
        }
    }
}

impl From<InventoryError> for OrderError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(id) => OrderError::ProductNotFound(id),
            InventoryError::VariantNotFound {
                product_id,
                product_name,
                variant,
            } => OrderError::VariantNotFound {
                product_id,
                product_name,
                variant,
            },
            InventoryError::InsufficientStock {
                product_id,
                name,
                variant,
                requested,
                available,
            } => OrderError::InsufficientStock {
                product_id,
                name,
                variant,
                requested,
                available,
            },
            InventoryError::ZeroQuantity => {
                OrderError::Internal("zero quantity reached the inventory ledger".into())
            }
            InventoryError::Overflow(id) => {
                OrderError::Internal(format!("stock overflow for {}", id))
            }
            InventoryError::Storage(e) => OrderError::Storage(e),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::EmptyOrder => AppError::with_message(ErrorCode::OrderEmpty, message),
            OrderError::InvalidQuantity {
                product_id,
                quantity,
            } => AppError::with_message(ErrorCode::InvalidQuantity, message)
                .with_detail("product_id", product_id)
                .with_detail("quantity", quantity),
            OrderError::MissingCustomerFields(fields) => {
                AppError::with_message(ErrorCode::RequiredField, message)
                    .with_detail("fields", fields)
            }
            OrderError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, message).with_detail("product_id", id)
            }
            OrderError::VariantNotFound {
                product_id,
                variant,
                ..
            } => AppError::with_message(ErrorCode::VariantNotFound, message)
                .with_detail("product_id", product_id)
                .with_detail("variant", variant),
            OrderError::InsufficientStock {
                product_id,
                variant,
                requested,
                available,
                ..
            } => AppError::with_message(ErrorCode::InsufficientStock, message)
                .with_detail("product_id", product_id)
                .with_detail("variant", variant)
                .with_detail("requested", requested)
                .with_detail("available", available),
            OrderError::PaymentReferenceRequired => {
                AppError::with_message(ErrorCode::PaymentReferenceRequired, message)
            }
            OrderError::PaymentReference(e) => e.into(),
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            OrderError::InvalidTransition(t) => {
                AppError::with_message(ErrorCode::InvalidTransition, message)
                    .with_detail("machine", t.machine)
                    .with_detail("from", t.from)
                    .with_detail("to", t.to)
            }
            OrderError::Storage(e) => e.into(),
            OrderError::Internal(msg) => AppError::internal(msg),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
