//! 库存 - 原子扣减与回补

pub mod ledger;

pub use ledger::{InventoryError, InventoryLedger};
