//! Data models
//!
//! Shared between fulfillment-server and its clients (via API).

pub mod product;

// Re-exports
pub use product::*;
