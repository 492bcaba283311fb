//! Orders
//!
//! - **pricing**: basket resolution against the catalog snapshot
//! - **payment_guard**: single-use payment references
//! - **ledger**: checkout, the one transaction that creates an order
//! - **manager**: reads and admin status transitions
//!
//! # Data Flow
//!
//! ```text
//! CheckoutRequest → pricing → OrderLedger ──(redb txn)──→ Order + stock + outbox
//!                                                              ↓
//! admin / carrier → OrderManager, ShipmentService ──→ status machines
//! ```

pub mod error;
pub mod ledger;
pub mod manager;
pub mod payment_guard;
pub mod pricing;

pub use error::{OrderError, OrderResult};
pub use ledger::OrderLedger;
pub use manager::{OrderManager, OrderPage};
pub use payment_guard::{PaymentGuard, PaymentReferenceError, normalize_reference};
pub use pricing::{ResolvedBasket, resolve_items};
