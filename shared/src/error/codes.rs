//! Unified error codes for the fulfillment service
//!
//! This module defines all error codes used by fulfillment-server, the storefront and the
//! admin console. Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product / inventory errors
//! - 7xxx: Shipment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, Kotlin, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Resource already exists
    AlreadyExists = 4,
    /// Required field is missing
    RequiredField = 7,
    /// Value is out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Checkout without any line item
    OrderEmpty = 4002,
    /// Illegal status change
    InvalidTransition = 4003,
    /// Quantity is zero or above the per-line maximum
    InvalidQuantity = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment reference malformed or too short
    InvalidPaymentReference = 5001,
    /// Payment reference already consumed by another order
    DuplicatePaymentReference = 5002,
    /// Prepaid checkout without a payment reference
    PaymentReferenceRequired = 5003,

    // ==================== 6xxx: Product ====================
    ProductNotFound = 6001,
    VariantNotFound = 6002,
    InsufficientStock = 6003,

    // ==================== 7xxx: Shipment ====================
    /// Carrier unreachable, malformed response or carrier-side failure
    GatewayError = 7001,
    /// Operation needs an existing carrier shipment (AWB)
    ShipmentNotCreated = 7002,
    /// Carrier integration has no credentials configured
    CarrierNotConfigured = 7003,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    NetworkError = 9003,
    TimeoutError = 9004,
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    StorageFull = 9401,
    StorageCorrupted = 9403,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::InvalidTransition => "Status transition is not allowed",
            ErrorCode::InvalidQuantity => "Invalid quantity",

            // Payment
            ErrorCode::InvalidPaymentReference => "Payment reference is invalid",
            ErrorCode::DuplicatePaymentReference => "Payment reference has already been used",
            ErrorCode::PaymentReferenceRequired => "Prepaid orders require a payment reference",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::VariantNotFound => "Product variant not found",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // Shipment
            ErrorCode::GatewayError => "Shipping carrier request failed",
            ErrorCode::ShipmentNotCreated => "Shipment has not been created yet",
            ErrorCode::CarrierNotConfigured => "Shipping carrier is not configured",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            4 => Ok(ErrorCode::AlreadyExists),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::InvalidTransition),
            4004 => Ok(ErrorCode::InvalidQuantity),

            // Payment
            5001 => Ok(ErrorCode::InvalidPaymentReference),
            5002 => Ok(ErrorCode::DuplicatePaymentReference),
            5003 => Ok(ErrorCode::PaymentReferenceRequired),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::VariantNotFound),
            6003 => Ok(ErrorCode::InsufficientStock),

            // Shipment
            7001 => Ok(ErrorCode::GatewayError),
            7002 => Ok(ErrorCode::ShipmentNotCreated),
            7003 => Ok(ErrorCode::CarrierNotConfigured),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
