//! Order record
//!
//! Created once at checkout and never deleted. Only the status fields and the
//! shipment metadata change afterwards, through the status machines.

use super::status::{FulfillmentStatus, PaymentStatus, ShipmentStatus};
use super::types::{CustomerSnapshot, OrderLine, PaymentMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Persisted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (assigned by server)
    pub id: String,
    pub customer: CustomerSnapshot,
    pub lines: Vec<OrderLine>,
    /// Sum of line totals
    pub subtotal: Decimal,
    /// Flat fee, identical for every order placed under the same configuration
    pub delivery_fee: Decimal,
    /// subtotal + delivery_fee
    pub total: Decimal,
    pub payment_mode: PaymentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub shipment_status: ShipmentStatus,

    // === Shipment metadata ===
    /// Carrier-side shipment ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_reference_id: Option<String>,
    /// AWB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery_date: Option<String>,
    /// Raw status text from the last tracking refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_carrier_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_shipment_error: Option<String>,

    /// Creation time (Unix millis)
    pub created_at: i64,
    /// Last modification time (Unix millis)
    pub updated_at: i64,
}

impl Order {
    /// Sum of line totals plus the delivery fee, recomputed from the lines
    pub fn recomputed_total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::line_total).sum::<Decimal>() + self.delivery_fee
    }

    /// Total number of units across all lines
    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}
