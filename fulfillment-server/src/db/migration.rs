//! Versioned schema migration
//!
//! Runs once when the database is opened, never at request time. The applied
//! version lives in the `meta` table under [`SCHEMA_VERSION_KEY`]; each step
//! runs in its own write transaction together with the version bump, so a
//! crash mid-migration leaves the previous version intact.

use redb::{Database, ReadableTable, WriteTransaction};

use super::storage::{
    META_TABLE, NOTIFICATION_DEAD_LETTER_TABLE, NOTIFICATION_OUTBOX_TABLE, ORDER_INDEX_TABLE,
    ORDERS_TABLE, PAYMENT_REFERENCES_TABLE, PRODUCTS_TABLE, SHIPMENT_ATTEMPTS_TABLE,
    StorageError, StorageResult, UNRECOGNIZED_STATUSES_TABLE,
};

pub const SCHEMA_VERSION_KEY: &str = "schema_version";

struct Migration {
    version: u64,
    description: &'static str,
    apply: fn(&WriteTransaction) -> StorageResult<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "catalog, orders and payment references",
        apply: create_core_tables,
    },
    Migration {
        version: 2,
        description: "shipment audit, notification outbox and carrier status counters",
        apply: create_fulfillment_tables,
    },
];

/// Latest schema version known to this build
pub fn current_version() -> u64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

fn create_core_tables(txn: &WriteTransaction) -> StorageResult<()> {
    let _ = txn.open_table(PRODUCTS_TABLE)?;
    let _ = txn.open_table(ORDERS_TABLE)?;
    let _ = txn.open_table(ORDER_INDEX_TABLE)?;
    let _ = txn.open_table(PAYMENT_REFERENCES_TABLE)?;
    Ok(())
}

fn create_fulfillment_tables(txn: &WriteTransaction) -> StorageResult<()> {
    let _ = txn.open_table(SHIPMENT_ATTEMPTS_TABLE)?;
    let _ = txn.open_table(NOTIFICATION_OUTBOX_TABLE)?;
    let _ = txn.open_table(NOTIFICATION_DEAD_LETTER_TABLE)?;
    let _ = txn.open_table(UNRECOGNIZED_STATUSES_TABLE)?;
    Ok(())
}

fn stored_version(txn: &WriteTransaction) -> StorageResult<u64> {
    let table = txn.open_table(META_TABLE)?;
    let version = table.get(SCHEMA_VERSION_KEY)?.map(|g| g.value()).unwrap_or(0);
    Ok(version)
}

/// Apply every pending migration; returns the resulting schema version
pub fn run(db: &Database) -> StorageResult<u64> {
    let txn = db.begin_write()?;
    let found = stored_version(&txn)?;
    txn.abort()?;

    let supported = current_version();
    if found > supported {
        return Err(StorageError::SchemaTooNew { found, supported });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
        let txn = db.begin_write()?;
        (migration.apply)(&txn)?;
        {
            let mut meta = txn.open_table(META_TABLE)?;
            meta.insert(SCHEMA_VERSION_KEY, migration.version)?;
        }
        txn.commit()?;
        tracing::info!(
            version = migration.version,
            description = migration.description,
            "Applied schema migration"
        );
    }

    Ok(supported)
}
