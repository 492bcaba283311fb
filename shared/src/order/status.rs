//! Order status state machines
//!
//! Three independent machines hang off every order:
//!
//! ```text
//! Fulfillment: PENDING → PACKED → IN_TRANSIT → DELIVERED
//!              PENDING | PACKED → CANCELLED
//! Payment:     COD | PENDING_VERIFICATION → PAID | VERIFIED | FAILED
//! Shipment:    PENDING → CREATED
//!              PENDING → FAILED → PENDING (retry)
//! ```
//!
//! Moving into the current state is a no-op, never an error, so duplicate
//! admin clicks are harmless. Any edge not listed above is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Illegal status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{machine} status cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub machine: &'static str,
    pub from: String,
    pub to: String,
}

/// Outcome of a legal status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changes
    Applied,
    /// Already in the requested state
    Unchanged,
}

/// Common behaviour of the order status machines
pub trait StatusMachine: Copy + Eq + fmt::Display {
    /// Machine name used in error messages
    const MACHINE: &'static str;

    /// Whether `self → next` is a legal edge (self-loops excluded)
    fn allows(self, next: Self) -> bool;

    /// Terminal states accept no outgoing edge
    fn is_terminal(self) -> bool;

    /// Validate a status change without applying it
    fn transition(self, next: Self) -> Result<Transition, InvalidTransition> {
        if self == next {
            return Ok(Transition::Unchanged);
        }
        if self.allows(next) {
            Ok(Transition::Applied)
        } else {
            Err(InvalidTransition {
                machine: Self::MACHINE,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

// ============================================================================
// Fulfillment
// ============================================================================

/// Physical progress of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    #[default]
    Pending,
    Packed,
    InTransit,
    Delivered,
    Cancelled,
}

/// Forward progression, cancellation excluded
const FULFILLMENT_PROGRESSION: [FulfillmentStatus; 4] = [
    FulfillmentStatus::Pending,
    FulfillmentStatus::Packed,
    FulfillmentStatus::InTransit,
    FulfillmentStatus::Delivered,
];

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Packed => "PACKED",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    fn progression_index(self) -> Option<usize> {
        FULFILLMENT_PROGRESSION.iter().position(|s| *s == self)
    }

    /// Legal single steps leading from `self` to `target`
    ///
    /// Empty when `target` is the current state, lies behind it, or either end
    /// is `Cancelled`. Each returned step is a legal edge from its predecessor.
    pub fn steps_toward(self, target: Self) -> Vec<Self> {
        match (self.progression_index(), target.progression_index()) {
            (Some(from), Some(to)) if to > from => FULFILLMENT_PROGRESSION[from + 1..=to].to_vec(),
            _ => Vec::new(),
        }
    }
}

impl StatusMachine for FulfillmentStatus {
    const MACHINE: &'static str = "fulfillment";

    fn allows(self, next: Self) -> bool {
        use FulfillmentStatus::*;
        matches!(
            (self, next),
            (Pending, Packed)
                | (Packed, InTransit)
                | (InTransit, Delivered)
                | (Pending, Cancelled)
                | (Packed, Cancelled)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payment
// ============================================================================

/// Payment state of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Cash on delivery, collected by the carrier
    Cod,
    /// Prepaid, payment reference awaiting admin verification
    PendingVerification,
    Paid,
    Verified,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cod => "COD",
            Self::PendingVerification => "PENDING_VERIFICATION",
            Self::Paid => "PAID",
            Self::Verified => "VERIFIED",
            Self::Failed => "FAILED",
        }
    }
}

impl StatusMachine for PaymentStatus {
    const MACHINE: &'static str = "payment";

    fn allows(self, next: Self) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Verified | Self::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Shipment
// ============================================================================

/// Carrier shipment state of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Created,
    Failed,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Created => "CREATED",
            Self::Failed => "FAILED",
        }
    }
}

impl StatusMachine for ShipmentStatus {
    const MACHINE: &'static str = "shipment";

    fn allows(self, next: Self) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Pending, Created) | (Pending, Failed) | (Failed, Pending)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Created)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
