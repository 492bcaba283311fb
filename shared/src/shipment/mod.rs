//! Shipment types shared between the server and its clients

pub mod types;

pub use types::*;
