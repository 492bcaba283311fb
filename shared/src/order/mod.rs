//! Order Module
//!
//! This module provides the types of the order lifecycle:
//! - Checkout input: customer snapshot, basket items, payment mode
//! - The persisted order record and its locked-in lines
//! - Status machines for fulfillment, payment and shipment

pub mod snapshot;
pub mod status;
pub mod types;

// Re-exports
pub use snapshot::Order;
pub use status::{
    FulfillmentStatus, InvalidTransition, PaymentStatus, ShipmentStatus, StatusMachine,
    Transition,
};
pub use types::*;
