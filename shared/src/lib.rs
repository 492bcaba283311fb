//! Shared types for the fulfillment service
//!
//! Domain types used by fulfillment-server and its HTTP clients: catalog
//! products, orders and their status machines, shipment records, and the
//! unified error / response structures.

pub mod error;
pub mod models;
pub mod order;
pub mod shipment;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
