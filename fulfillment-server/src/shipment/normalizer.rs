//! Carrier status normalizer
//!
//! Carriers describe the same state in many ways ("IN_TRANSIT", "In-Transit",
//! "shipped"). Normalization runs in three passes:
//!
//! 1. clean: trim, lowercase, `_`/`-` become spaces, whitespace collapsed
//! 2. exact lookup in [`SYNONYMS`]
//! 3. keyword fallback, which never yields `Delivered`
//!
//! Anything left over is `Unrecognized`. The synonym table is append-only;
//! extend it from the unrecognized-status counter.

use shared::shipment::{CanonicalStatus, NormalizedStatus};

use CanonicalStatus::*;

/// Cleaned carrier status → canonical status
pub const SYNONYMS: &[(&str, CanonicalStatus)] = &[
    // pickup pending
    ("pickup pending", PickupPending),
    ("pending pickup", PickupPending),
    ("awaiting pickup", PickupPending),
    ("ready to ship", PickupPending),
    ("manifested", PickupPending),
    ("new", PickupPending),
    // pickup scheduled
    ("pickup scheduled", PickupScheduled),
    ("pickup generated", PickupScheduled),
    ("pickup queued", PickupScheduled),
    ("out for pickup", PickupScheduled),
    ("pickup rescheduled", PickupScheduled),
    // picked up
    ("picked up", PickedUp),
    ("pickedup", PickedUp),
    ("pickup complete", PickedUp),
    ("pickup completed", PickedUp),
    ("collected", PickedUp),
    // in transit
    ("in transit", InTransit),
    ("intransit", InTransit),
    ("shipped", InTransit),
    ("dispatched", InTransit),
    ("reached at destination hub", InTransit),
    ("reached destination hub", InTransit),
    ("arrived at hub", InTransit),
    ("departed from hub", InTransit),
    ("in transit to destination", InTransit),
    // out for delivery
    ("out for delivery", OutForDelivery),
    ("ofd", OutForDelivery),
    ("with delivery agent", OutForDelivery),
    // delivered
    ("delivered", Delivered),
    ("delivery completed", Delivered),
    ("delivered to consignee", Delivered),
    // packed
    ("packed", Packed),
    ("label generated", Packed),
    ("awb assigned", Packed),
    ("ready for pickup", Packed),
];

/// Clean raw status text for lookup
pub fn clean(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map raw carrier text onto the canonical vocabulary
pub fn normalize(raw: &str) -> NormalizedStatus {
    let cleaned = clean(raw);
    if let Some((_, status)) = SYNONYMS.iter().find(|(synonym, _)| *synonym == cleaned) {
        return NormalizedStatus::Canonical(*status);
    }
    match keyword_match(&cleaned) {
        Some(status) => NormalizedStatus::Canonical(status),
        None => NormalizedStatus::Unrecognized(cleaned),
    }
}

fn keyword_match(cleaned: &str) -> Option<CanonicalStatus> {
    let has_word = |word: &str| cleaned.split(' ').any(|w| w == word);
    let pickup = cleaned.contains("pickup") || cleaned.contains("pick up");

    if cleaned.contains("transit") {
        Some(InTransit)
    } else if has_word("out") && cleaned.contains("delivery") {
        Some(OutForDelivery)
    } else if pickup && cleaned.contains("schedul") {
        Some(PickupScheduled)
    } else if cleaned.contains("picked") {
        Some(PickedUp)
    } else if cleaned.contains("pack") {
        Some(Packed)
    } else if pickup && cleaned.contains("pending") {
        Some(PickupPending)
    } else {
        None
    }
}
