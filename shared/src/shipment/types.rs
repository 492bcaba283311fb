//! Shipment and carrier types

use crate::order::FulfillmentStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Carrier pickup location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

/// Physical package attributes sent to the carrier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageDimensions {
    pub weight_kg: Decimal,
    pub length_cm: Decimal,
    pub breadth_cm: Decimal,
    pub height_cm: Decimal,
}

impl PackageDimensions {
    /// Names of attributes that are zero or negative
    pub fn non_positive_fields(&self) -> Vec<&'static str> {
        [
            ("weight_kg", self.weight_kg),
            ("length_cm", self.length_cm),
            ("breadth_cm", self.breadth_cm),
            ("height_cm", self.height_cm),
        ]
        .into_iter()
        .filter(|(_, v)| *v <= Decimal::ZERO)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Admin request to book a shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
    pub warehouse_id: String,
    pub package: PackageDimensions,
}

/// Carrier identifiers of a booked shipment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShipmentRef {
    pub shipment_id: String,
    /// AWB
    pub tracking_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
}

/// Tracking data returned by the carrier for one AWB
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingInfo {
    pub raw_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
}

// ============================================================================
// Canonical status vocabulary
// ============================================================================

/// Fixed vocabulary carrier status text is normalized into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    PickupPending,
    PickupScheduled,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Packed,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PickupPending => "PICKUP_PENDING",
            Self::PickupScheduled => "PICKUP_SCHEDULED",
            Self::PickedUp => "PICKED_UP",
            Self::InTransit => "IN_TRANSIT",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Packed => "PACKED",
        }
    }

    /// Fulfillment state this carrier status corresponds to
    pub fn fulfillment_target(&self) -> FulfillmentStatus {
        match self {
            Self::PickupPending | Self::PickupScheduled | Self::Packed => FulfillmentStatus::Packed,
            Self::PickedUp | Self::InTransit | Self::OutForDelivery => FulfillmentStatus::InTransit,
            Self::Delivered => FulfillmentStatus::Delivered,
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of normalizing a raw carrier status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizedStatus {
    Canonical(CanonicalStatus),
    /// Sentinel carrying the cleaned input; not an error
    Unrecognized(String),
}

impl NormalizedStatus {
    pub fn canonical(&self) -> Option<CanonicalStatus> {
        match self {
            Self::Canonical(s) => Some(*s),
            Self::Unrecognized(_) => None,
        }
    }
}

// ============================================================================
// Audit / diagnostics records
// ============================================================================

/// Outcome of a single create-shipment call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptOutcome {
    Created,
    Failed,
}

/// Append-only record of a create-shipment attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShipmentAttempt {
    pub order_id: String,
    /// 1-based, per order
    pub attempt: u32,
    pub warehouse_id: String,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Truncated raw carrier body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_excerpt: Option<String>,
    pub created_at: i64,
}

/// Result of a tracking refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingUpdate {
    pub order_id: String,
    pub raw_status: String,
    pub normalized: NormalizedStatus,
    /// Fulfillment state after the update was applied
    pub fulfillment_status: FulfillmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_name: Option<String>,
}

/// Carrier status text that matched nothing, kept to extend the synonym table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnrecognizedStatus {
    /// Trimmed, lowercased text
    pub status: String,
    pub count: u64,
    pub first_seen: i64,
    pub last_seen: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fulfillment_target() {
        assert_eq!(
            CanonicalStatus::PickupScheduled.fulfillment_target(),
            FulfillmentStatus::Packed
        );
        assert_eq!(
            CanonicalStatus::OutForDelivery.fulfillment_target(),
            FulfillmentStatus::InTransit
        );
        assert_eq!(
            CanonicalStatus::Delivered.fulfillment_target(),
            FulfillmentStatus::Delivered
        );
    }

    #[test]
    fn test_package_validation() {
        let pkg = PackageDimensions {
            weight_kg: dec!(0.5),
            length_cm: dec!(10),
            breadth_cm: Decimal::ZERO,
            height_cm: dec!(-1),
        };
        assert_eq!(pkg.non_positive_fields(), vec!["breadth_cm", "height_cm"]);
    }

    #[test]
    fn test_normalized_status_serde() {
        let json = serde_json::to_string(&NormalizedStatus::Canonical(CanonicalStatus::InTransit))
            .unwrap();
        assert_eq!(json, r#"{"kind":"CANONICAL","value":"IN_TRANSIT"}"#);

        let json = serde_json::to_string(&NormalizedStatus::Unrecognized("foo".into())).unwrap();
        assert_eq!(json, r#"{"kind":"UNRECOGNIZED","value":"foo"}"#);
    }
}
