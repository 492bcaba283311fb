//! Order ledger - checkout
//!
//! # Checkout flow
//!
//! ```text
//! validate request → resolve basket (catalog snapshot)
//!        ↓
//! ┌─────────────── one redb write transaction ───────────────┐
//! │ consume payment reference (prepaid)                       │
//! │ insert order                                              │
//! │ decrement stock for every line                            │
//! │ enqueue admin notification (outbox)                       │
//! └───────────────────────────────────────────────────────────┘
//!        ↓ commit                         ↓ any error → abort
//! wake notification worker          nothing becomes visible
//! ```

use std::sync::Arc;

use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::order::{
    CheckoutRequest, FulfillmentStatus, Order, PaymentMode, PaymentStatus, ShipmentStatus,
};
use shared::util::{new_order_id, now_millis, snowflake_id};
use tokio::sync::Notify;

use super::error::{OrderError, OrderResult};
use super::payment_guard::{PaymentGuard, normalize_reference};
use super::pricing::{ResolvedBasket, resolve_items};
use crate::catalog::CatalogReader;
use crate::db::{OutboxEntry, Storage, StorageError};
use crate::inventory::InventoryLedger;

/// Creates orders
#[derive(Debug, Clone)]
pub struct OrderLedger {
    storage: Storage,
    catalog: CatalogReader,
    inventory: InventoryLedger,
    guard: PaymentGuard,
    delivery_fee: Decimal,
    outbox_signal: Arc<Notify>,
}

impl OrderLedger {
    pub fn new(storage: Storage, delivery_fee: Decimal, outbox_signal: Arc<Notify>) -> Self {
        Self {
            catalog: CatalogReader::new(storage.clone()),
            inventory: InventoryLedger::new(storage.clone()),
            guard: PaymentGuard::new(storage.clone()),
            storage,
            delivery_fee,
            outbox_signal,
        }
    }

    /// Place an order
    ///
    /// Either the order, its stock decrements, the consumed payment reference
    /// and its notification are all committed, or none of them are.
    pub fn checkout(&self, req: &CheckoutRequest) -> OrderResult<Order> {
        let missing = req.customer.missing_fields();
        if !missing.is_empty() {
            return Err(OrderError::MissingCustomerFields(missing));
        }

        let payment_reference = match (req.payment_mode, req.payment_reference.as_deref()) {
            (PaymentMode::Prepaid, Some(raw)) => Some(normalize_reference(raw)?),
            (PaymentMode::Prepaid, None) => return Err(OrderError::PaymentReferenceRequired),
            (PaymentMode::Cod, Some(_)) => {
                tracing::debug!("Ignoring payment reference on COD checkout");
                None
            }
            (PaymentMode::Cod, None) => None,
        };

        let basket = resolve_items(&self.catalog, &req.items)?;
        let order = self.build_order(req, basket, payment_reference);

        let txn = self.storage.begin_write()?;
        match self.persist_txn(&txn, &order) {
            Ok(()) => txn.commit().map_err(StorageError::from)?,
            Err(e) => {
                txn.abort().map_err(StorageError::from)?;
                tracing::info!(order_id = %order.id, error = %e, "Checkout rejected");
                return Err(e);
            }
        }

        self.outbox_signal.notify_one();
        tracing::info!(
            order_id = %order.id,
            total = %order.total,
            lines = order.lines.len(),
            payment_mode = ?order.payment_mode,
            "Order created"
        );
        Ok(order)
    }

    fn build_order(
        &self,
        req: &CheckoutRequest,
        basket: ResolvedBasket,
        payment_reference: Option<String>,
    ) -> Order {
        let now = now_millis();
        let payment_status = match req.payment_mode {
            PaymentMode::Cod => PaymentStatus::Cod,
            PaymentMode::Prepaid => PaymentStatus::PendingVerification,
        };
        Order {
            id: new_order_id(),
            customer: req.customer.clone(),
            lines: basket.lines,
            subtotal: basket.subtotal,
            delivery_fee: self.delivery_fee,
            total: basket.subtotal + self.delivery_fee,
            payment_mode: req.payment_mode,
            payment_reference,
            payment_status,
            fulfillment_status: FulfillmentStatus::Pending,
            shipment_status: ShipmentStatus::Pending,
            shipment_reference_id: None,
            tracking_number: None,
            courier_name: None,
            expected_delivery_date: None,
            last_carrier_status: None,
            last_shipment_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn persist_txn(&self, txn: &WriteTransaction, order: &Order) -> OrderResult<()> {
        // payment reference first: a reused token must not touch stock
        if let Some(token) = &order.payment_reference {
            self.guard.consume_txn(txn, token, &order.id)?;
        }

        self.storage.insert_order_txn(txn, order)?;

        for line in &order.lines {
            self.inventory.decrement_txn(
                txn,
                &line.product_id,
                line.variant_label.as_deref(),
                line.quantity,
            )?;
        }

        self.storage
            .enqueue_notification_txn(txn, &new_order_notification(order))?;
        Ok(())
    }
}

fn new_order_notification(order: &Order) -> OutboxEntry {
    OutboxEntry {
        id: snowflake_id(),
        order_id: order.id.clone(),
        title: format!("New order {}", order.id),
        body: format!(
            "{} ordered {} item(s), total {} ({:?})",
            order.customer.name,
            order.unit_count(),
            order.total,
            order.payment_mode
        ),
        deep_link: format!("/admin/orders/{}", order.id),
        created_at: order.created_at,
        retry_count: 0,
        last_attempt_at: None,
        last_error: None,
    }
}
