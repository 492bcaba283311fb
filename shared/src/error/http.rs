//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::OrderNotFound
            | Self::ProductNotFound
            | Self::VariantNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (state on the server disagrees with the request)
            Self::AlreadyExists
            | Self::DuplicatePaymentReference
            | Self::InsufficientStock
            | Self::InvalidTransition
            | Self::ShipmentNotCreated => StatusCode::CONFLICT,

            // 502 Bad Gateway (carrier misbehaved)
            Self::GatewayError => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::CarrierNotConfigured
            | Self::StorageFull
            | Self::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
