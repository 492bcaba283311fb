//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Catalog snapshot (price + stock) |
//! | `orders` | `order_id` | `Order` | Order records (never deleted) |
//! | `order_index` | `(created_at, order_id)` | `()` | Creation-time ordering |
//! | `payment_references` | `token` | `PaymentReferenceRecord` | Consumed UTRs (write-once) |
//! | `shipment_attempts` | `(order_id, attempt)` | `ShipmentAttempt` | Carrier call audit log |
//! | `notification_outbox` | `entry_id` | `OutboxEntry` | Pending admin notifications |
//! | `notification_dead_letter` | `entry_id` | `DeadNotification` | Permanently failed notifications |
//! | `unrecognized_statuses` | `status` | `UnrecognizedStatus` | Unknown carrier status counter |
//! | `meta` | key | `u64` | Schema version |
//!
//! # Atomicity
//!
//! redb serializes write transactions. Every multi-step mutation (checkout,
//! cancellation restock, shipment result) happens inside a single
//! `WriteTransaction`; dropping or aborting it discards all of its writes.
//! Methods suffixed with `_txn` operate on a caller-owned transaction.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Product;
use shared::order::Order;
use shared::shipment::{ShipmentAttempt, UnrecognizedStatus};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::migration;

pub(crate) const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

pub(crate) const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// key = (created_at, order_id), value = empty (ordering only)
pub(crate) const ORDER_INDEX_TABLE: TableDefinition<(i64, &str), ()> =
    TableDefinition::new("order_index");

pub(crate) const PAYMENT_REFERENCES_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("payment_references");

pub(crate) const SHIPMENT_ATTEMPTS_TABLE: TableDefinition<(&str, u32), &[u8]> =
    TableDefinition::new("shipment_attempts");

pub(crate) const NOTIFICATION_OUTBOX_TABLE: TableDefinition<i64, &[u8]> =
    TableDefinition::new("notification_outbox");

pub(crate) const NOTIFICATION_DEAD_LETTER_TABLE: TableDefinition<i64, &[u8]> =
    TableDefinition::new("notification_dead_letter");

pub(crate) const UNRECOGNIZED_STATUSES_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("unrecognized_statuses");

pub(crate) const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Consumed payment reference (UTR)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentReferenceRecord {
    pub token: String,
    pub order_id: String,
    pub created_at: i64,
}

/// Pending notification in the outbox
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: i64,
    pub order_id: String,
    pub title: String,
    pub body: String,
    pub deep_link: String,
    pub created_at: i64,
    pub retry_count: u32,
    #[serde(default)]
    pub last_attempt_at: Option<i64>,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Dead letter entry (permanently failed notification)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeadNotification {
    pub entry: OutboxEntry,
    pub failed_at: i64,
    pub last_error: String,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u64, supported: u64 },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Map a storage failure to an error code
///
/// redb errors carry no stable kind, so they are classified by message.
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::Serialization(_) => return ErrorCode::InternalError,
        StorageError::SchemaTooNew { .. } => return ErrorCode::ConfigError,
        _ => {}
    }

    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    ErrorCode::DatabaseError
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let code = classify_storage_error(&err);
        tracing::error!(error = %err, error_code = %code, "Storage error occurred");
        AppError::with_message(code, err.to_string())
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Embedded transactional store backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Open or create the database at the given path and bring its schema up to date
    ///
    /// redb uses `Durability::Immediate` by default: commits are persistent as
    /// soon as `commit()` returns.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        migration::run(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        migration::run(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Cheap liveness probe: opens a read transaction and the meta table
    pub fn ping(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(META_TABLE)?;
        Ok(())
    }

    // ========== Meta ==========

    pub fn get_meta(&self, key: &str) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(META_TABLE)?;
        Ok(table.get(key)?.map(|g| g.value()))
    }

    // ========== Products ==========

    pub fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        let product = match table.get(product_id)? {
            Some(value) => Some(decode(value.value())?),
            None => None,
        };
        Ok(product)
    }

    pub fn put_product_txn(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Insert or replace a product (catalog management / test fixtures)
    pub fn put_product(&self, product: &Product) -> StorageResult<()> {
        let txn = self.begin_write()?;
        self.put_product_txn(&txn, product)?;
        txn.commit()?;
        Ok(())
    }

    /// Insert a product unless one with the same id exists; returns whether it was inserted
    pub fn insert_product_if_absent(&self, product: &Product) -> StorageResult<bool> {
        let txn = self.begin_write()?;
        let exists = self.get_product_txn(&txn, &product.id)?.is_some();
        if exists {
            txn.abort()?;
            return Ok(false);
        }
        self.put_product_txn(&txn, product)?;
        txn.commit()?;
        Ok(true)
    }

    // ========== Orders ==========

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let order = match table.get(order_id)? {
            Some(value) => Some(decode(value.value())?),
            None => None,
        };
        Ok(order)
    }

    /// Insert a new order and its ordering index entry
    pub fn insert_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        self.put_order_txn(txn, order)?;
        let mut index = txn.open_table(ORDER_INDEX_TABLE)?;
        index.insert((order.created_at, order.id.as_str()), ())?;
        Ok(())
    }

    /// Overwrite an existing order record
    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Orders newest first
    pub fn list_orders(&self, limit: usize, offset: usize) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDER_INDEX_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in index.iter()?.rev().skip(offset).take(limit) {
            let (key, _) = entry?;
            let (_, order_id) = key.value();
            if let Some(value) = orders.get(order_id)? {
                result.push(decode(value.value())?);
            }
        }
        Ok(result)
    }

    pub fn count_orders(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        Ok(table.len()?)
    }

    /// Orders matching a predicate, oldest first
    pub fn find_orders(&self, predicate: impl Fn(&Order) -> bool) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDER_INDEX_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in index.iter()? {
            let (key, _) = entry?;
            let (_, order_id) = key.value();
            if let Some(value) = orders.get(order_id)? {
                let order: Order = decode(value.value())?;
                if predicate(&order) {
                    result.push(order);
                }
            }
        }
        Ok(result)
    }

    // ========== Payment References ==========

    /// Atomic insert-if-absent; returns `false` when the token already exists
    pub fn insert_payment_reference_txn(
        &self,
        txn: &WriteTransaction,
        record: &PaymentReferenceRecord,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(PAYMENT_REFERENCES_TABLE)?;
        if table.get(record.token.as_str())?.is_some() {
            return Ok(false);
        }
        let value = serde_json::to_vec(record)?;
        table.insert(record.token.as_str(), value.as_slice())?;
        Ok(true)
    }

    pub fn get_payment_reference_txn(
        &self,
        txn: &WriteTransaction,
        token: &str,
    ) -> StorageResult<Option<PaymentReferenceRecord>> {
        let table = txn.open_table(PAYMENT_REFERENCES_TABLE)?;
        let record = match table.get(token)? {
            Some(value) => Some(decode(value.value())?),
            None => None,
        };
        Ok(record)
    }

    pub fn get_payment_reference(
        &self,
        token: &str,
    ) -> StorageResult<Option<PaymentReferenceRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENT_REFERENCES_TABLE)?;
        match table.get(token)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Shipment Attempts ==========

    /// Next 1-based attempt number for an order
    pub fn next_attempt_number_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<u32> {
        let table = txn.open_table(SHIPMENT_ATTEMPTS_TABLE)?;
        let last = table
            .range((order_id, 0u32)..=(order_id, u32::MAX))?
            .next_back()
            .transpose()?
            .map(|(key, _)| key.value().1)
            .unwrap_or(0);
        Ok(last + 1)
    }

    pub fn append_shipment_attempt_txn(
        &self,
        txn: &WriteTransaction,
        attempt: &ShipmentAttempt,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SHIPMENT_ATTEMPTS_TABLE)?;
        let value = serde_json::to_vec(attempt)?;
        table.insert((attempt.order_id.as_str(), attempt.attempt), value.as_slice())?;
        Ok(())
    }

    pub fn list_shipment_attempts(&self, order_id: &str) -> StorageResult<Vec<ShipmentAttempt>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHIPMENT_ATTEMPTS_TABLE)?;
        let mut attempts = Vec::new();
        for entry in table.range((order_id, 0u32)..=(order_id, u32::MAX))? {
            let (_, value) = entry?;
            attempts.push(decode(value.value())?);
        }
        Ok(attempts)
    }

    // ========== Notification Outbox ==========

    pub fn enqueue_notification_txn(
        &self,
        txn: &WriteTransaction,
        entry: &OutboxEntry,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(NOTIFICATION_OUTBOX_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert(entry.id, value.as_slice())?;
        Ok(())
    }

    /// All pending notifications, oldest first
    pub fn get_pending_notifications(&self) -> StorageResult<Vec<OutboxEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NOTIFICATION_OUTBOX_TABLE)?;
        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            entries.push(decode(value.value())?);
        }
        Ok(entries)
    }

    /// Remove a delivered notification
    pub fn complete_notification(&self, id: i64) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(NOTIFICATION_OUTBOX_TABLE)?;
            table.remove(id)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Record a failed delivery attempt
    pub fn mark_notification_failed(&self, id: i64, error: &str) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(NOTIFICATION_OUTBOX_TABLE)?;

            // Read and clone first to avoid borrow conflict
            let entry_opt: Option<OutboxEntry> = match table.get(id)? {
                Some(value) => Some(decode(value.value())?),
                None => None,
            };

            if let Some(mut entry) = entry_opt {
                entry.retry_count += 1;
                entry.last_attempt_at = Some(shared::util::now_millis());
                entry.last_error = Some(error.to_string());
                let new_value = serde_json::to_vec(&entry)?;
                table.insert(id, new_value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Move a notification from the outbox to the dead letter table
    pub fn move_notification_to_dead_letter(&self, id: i64, error: &str) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut outbox = txn.open_table(NOTIFICATION_OUTBOX_TABLE)?;
            let mut dead_letter = txn.open_table(NOTIFICATION_DEAD_LETTER_TABLE)?;

            let entry_opt: Option<OutboxEntry> = match outbox.get(id)? {
                Some(value) => Some(decode(value.value())?),
                None => None,
            };

            if let Some(entry) = entry_opt {
                let dead = DeadNotification {
                    entry,
                    failed_at: shared::util::now_millis(),
                    last_error: error.to_string(),
                };
                let value = serde_json::to_vec(&dead)?;
                dead_letter.insert(id, value.as_slice())?;
                outbox.remove(id)?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    pub fn list_dead_notifications(&self) -> StorageResult<Vec<DeadNotification>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NOTIFICATION_DEAD_LETTER_TABLE)?;
        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            entries.push(decode(value.value())?);
        }
        Ok(entries)
    }

    /// Move every dead letter back to the outbox with a fresh retry budget
    ///
    /// Returns the number of recovered entries.
    pub fn recover_dead_notifications(&self) -> StorageResult<usize> {
        let txn = self.begin_write()?;
        let count = {
            let mut outbox = txn.open_table(NOTIFICATION_OUTBOX_TABLE)?;
            let mut dead_letter = txn.open_table(NOTIFICATION_DEAD_LETTER_TABLE)?;

            // Collect first (can't iterate and mutate simultaneously)
            let mut dead: Vec<DeadNotification> = Vec::new();
            for result in dead_letter.iter()? {
                let (_key, value) = result?;
                dead.push(decode(value.value())?);
            }

            for item in &dead {
                let mut entry = item.entry.clone();
                entry.retry_count = 0;
                entry.last_attempt_at = None;
                entry.last_error = None;
                let value = serde_json::to_vec(&entry)?;
                outbox.insert(entry.id, value.as_slice())?;
                dead_letter.remove(entry.id)?;
            }
            dead.len()
        };
        txn.commit()?;
        Ok(count)
    }

    // ========== Unrecognized Carrier Statuses ==========

    /// Count one occurrence of an unrecognized status; returns the new count
    pub fn record_unrecognized_status(&self, status: &str) -> StorageResult<u64> {
        let now = shared::util::now_millis();
        let txn = self.begin_write()?;
        let count = {
            let mut table = txn.open_table(UNRECOGNIZED_STATUSES_TABLE)?;
            let existing: Option<UnrecognizedStatus> = match table.get(status)? {
                Some(value) => Some(decode(value.value())?),
                None => None,
            };
            let record = match existing {
                Some(mut record) => {
                    record.count += 1;
                    record.last_seen = now;
                    record
                }
                None => UnrecognizedStatus {
                    status: status.to_string(),
                    count: 1,
                    first_seen: now,
                    last_seen: now,
                },
            };
            let value = serde_json::to_vec(&record)?;
            table.insert(status, value.as_slice())?;
            record.count
        };
        txn.commit()?;
        Ok(count)
    }

    /// Unrecognized statuses, most frequent first
    pub fn list_unrecognized_statuses(&self) -> StorageResult<Vec<UnrecognizedStatus>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(UNRECOGNIZED_STATUSES_TABLE)?;
        let mut records: Vec<UnrecognizedStatus> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            records.push(decode(value.value())?);
        }
        records.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
        Ok(records)
    }
}
