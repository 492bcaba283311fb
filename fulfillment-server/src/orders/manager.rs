//! OrderManager - admin reads and status transitions
//!
//! Every transition is checked against its status machine before anything is
//! written. Repeating the current status is a no-op that returns the stored
//! order unchanged, so duplicate admin clicks are harmless.

use redb::WriteTransaction;
use shared::order::{FulfillmentStatus, Order, PaymentStatus, StatusMachine, Transition};
use shared::util::now_millis;

use super::error::{OrderError, OrderResult};
use crate::db::{Storage, StorageError};
use crate::inventory::{InventoryError, InventoryLedger};

/// Default page size for order listings
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

/// One page of orders, newest first
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct OrderManager {
    storage: Storage,
    inventory: InventoryLedger,
}

impl OrderManager {
    pub fn new(storage: Storage) -> Self {
        Self {
            inventory: InventoryLedger::new(storage.clone()),
            storage,
        }
    }

    pub fn get_order(&self, order_id: &str) -> OrderResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    pub fn list_orders(&self, limit: Option<usize>, offset: Option<usize>) -> OrderResult<OrderPage> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        Ok(OrderPage {
            orders: self.storage.list_orders(limit, offset)?,
            total: self.storage.count_orders()?,
            limit,
            offset,
        })
    }

    /// Move an order's fulfillment status
    ///
    /// Cancelling returns every line's units to stock in the same transaction.
    pub fn update_fulfillment_status(
        &self,
        order_id: &str,
        next: FulfillmentStatus,
    ) -> OrderResult<Order> {
        self.mutate(order_id, |txn, order| {
            let from = order.fulfillment_status;
            if from.transition(next)? == Transition::Unchanged {
                return Ok(false);
            }
            if next == FulfillmentStatus::Cancelled {
                self.restock_lines_txn(txn, order)?;
            }
            order.fulfillment_status = next;
            tracing::info!(order_id = %order.id, from = %from, to = %next, "Fulfillment status changed");
            Ok(true)
        })
    }

    pub fn update_payment_status(&self, order_id: &str, next: PaymentStatus) -> OrderResult<Order> {
        self.mutate(order_id, |_, order| {
            let from = order.payment_status;
            if from.transition(next)? == Transition::Unchanged {
                return Ok(false);
            }
            order.payment_status = next;
            tracing::info!(order_id = %order.id, from = %from, to = %next, "Payment status changed");
            Ok(true)
        })
    }

    fn restock_lines_txn(&self, txn: &WriteTransaction, order: &Order) -> OrderResult<()> {
        let mut restocked = 0u32;
        for line in &order.lines {
            let variant = line.variant_label.as_deref();
            match self
                .inventory
                .restock_txn(txn, &line.product_id, variant, line.quantity)
            {
                Ok(_) => restocked = restocked.saturating_add(line.quantity),
                // catalog entry gone since checkout: nothing to return the units to
                Err(
                    e @ (InventoryError::ProductNotFound(_)
                    | InventoryError::VariantNotFound { .. }),
                ) => {
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        variant = ?variant,
                        quantity = line.quantity,
                        error = %e,
                        "Restock skipped"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(order_id = %order.id, units = restocked, "Cancelled order restocked");
        Ok(())
    }

    /// Load, mutate and store an order in one write transaction
    ///
    /// `apply` returns whether it changed anything; unchanged orders are not
    /// rewritten.
    fn mutate<F>(&self, order_id: &str, apply: F) -> OrderResult<Order>
    where
        F: FnOnce(&WriteTransaction, &mut Order) -> OrderResult<bool>,
    {
        let txn = self.storage.begin_write()?;
        match self.apply_txn(&txn, order_id, apply) {
            Ok((order, true)) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(order)
            }
            Ok((order, false)) => {
                txn.abort().map_err(StorageError::from)?;
                Ok(order)
            }
            Err(e) => {
                txn.abort().map_err(StorageError::from)?;
                Err(e)
            }
        }
    }

    fn apply_txn<F>(&self, txn: &WriteTransaction, order_id: &str, apply: F) -> OrderResult<(Order, bool)>
    where
        F: FnOnce(&WriteTransaction, &mut Order) -> OrderResult<bool>,
    {
        let mut order = self
            .storage
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        let changed = apply(txn, &mut order)?;
        if changed {
            order.updated_at = now_millis();
            self.storage.put_order_txn(txn, &order)?;
        }
        Ok((order, changed))
    }
}
