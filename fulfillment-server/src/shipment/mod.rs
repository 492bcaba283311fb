//! 物流 - 承运商对接与状态归一化
//!
//! - **carrier**: HTTP client for the carrier API
//! - **gateway**: booking, reset and tracking against the shipment machine
//! - **normalizer**: raw carrier status → canonical vocabulary
//! - **tracking_poller**: background tracking refresh

pub mod carrier;
pub mod error;
pub mod gateway;
pub mod normalizer;
pub mod tracking_poller;

pub use carrier::{CarrierApi, CarrierShipmentRequest, GatewayError, HttpCarrierClient};
pub use error::{ShipmentError, ShipmentResult};
pub use gateway::ShipmentService;
pub use normalizer::normalize;
pub use tracking_poller::TrackingPoller;
