//! Inventory ledger
//!
//! Conditional stock decrements and compensating restocks, keyed by product
//! or product + variant. A decrement reads and writes the stock counter
//! inside one redb write transaction; redb admits a single writer at a time,
//! so two orders racing for the last unit cannot both see it.

use redb::WriteTransaction;
use shared::models::{Product, display_name};
use thiserror::Error;

use crate::db::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Variant {} not found for {product_name}", .variant.as_deref().unwrap_or("(none)"))]
    VariantNotFound {
        product_id: String,
        product_name: String,
        variant: Option<String>,
    },

    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        name: String,
        variant: Option<String>,
        requested: u32,
        available: u32,
    },

    #[error("Quantity must be positive")]
    ZeroQuantity,

    #[error("Stock counter overflow for product {0}")]
    Overflow(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Stock mutations on the catalog
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    storage: Storage,
}

impl InventoryLedger {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Decrement stock in its own transaction; returns the remaining stock
    pub fn decrement(
        &self,
        product_id: &str,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<u32, InventoryError> {
        let txn = self.storage.begin_write()?;
        match self.decrement_txn(&txn, product_id, variant, quantity) {
            Ok(remaining) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(remaining)
            }
            Err(e) => {
                txn.abort().map_err(StorageError::from)?;
                Err(e)
            }
        }
    }

    /// Decrement stock inside a caller-owned transaction
    ///
    /// Fails without writing anything when the scope holds fewer than
    /// `quantity` units.
    pub fn decrement_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        let mut product = self.load(txn, product_id)?;
        let name = display_name(&product.name, variant);
        let stock = scoped_stock(&mut product, variant)?;

        if *stock < quantity {
            return Err(InventoryError::InsufficientStock {
                product_id: product_id.to_string(),
                name,
                variant: variant.map(str::to_string),
                requested: quantity,
                available: *stock,
            });
        }
        *stock -= quantity;
        let remaining = *stock;

        self.storage.put_product_txn(txn, &product)?;
        tracing::debug!(product_id = %product_id, variant = ?variant, quantity, remaining, "Stock decremented");
        Ok(remaining)
    }

    /// Return units to stock in its own transaction; returns the new stock
    pub fn restock(
        &self,
        product_id: &str,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<u32, InventoryError> {
        let txn = self.storage.begin_write()?;
        match self.restock_txn(&txn, product_id, variant, quantity) {
            Ok(stock) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(stock)
            }
            Err(e) => {
                txn.abort().map_err(StorageError::from)?;
                Err(e)
            }
        }
    }

    /// Return units to stock inside a caller-owned transaction
    pub fn restock_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        let mut product = self.load(txn, product_id)?;
        let stock = scoped_stock(&mut product, variant)?;
        *stock = stock
            .checked_add(quantity)
            .ok_or_else(|| InventoryError::Overflow(product_id.to_string()))?;
        let new_stock = *stock;

        self.storage.put_product_txn(txn, &product)?;
        tracing::debug!(product_id = %product_id, variant = ?variant, quantity, stock = new_stock, "Stock restored");
        Ok(new_stock)
    }

    fn load(&self, txn: &WriteTransaction, product_id: &str) -> Result<Product, InventoryError> {
        self.storage
            .get_product_txn(txn, product_id)?
            .ok_or_else(|| InventoryError::ProductNotFound(product_id.to_string()))
    }
}

fn scoped_stock<'a>(
    product: &'a mut Product,
    variant: Option<&str>,
) -> Result<&'a mut u32, InventoryError> {
    let product_id = product.id.clone();
    let product_name = product.name.clone();
    product
        .stock_mut(variant)
        .ok_or_else(|| InventoryError::VariantNotFound {
            product_id,
            product_name,
            variant: variant.map(str::to_string),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::models::{Pricing, Variant};

    fn setup() -> (Storage, InventoryLedger) {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .put_product(&Product {
                id: "simple".into(),
                name: "Charger".into(),
                pricing: Pricing::Simple {
                    price: dec!(500),
                    discount_price: None,
                    discount_percent: None,
                    stock: 5,
                },
            })
            .unwrap();
        storage
            .put_product(&Product {
                id: "mint".into(),
                name: "Mint".into(),
                pricing: Pricing::Variants {
                    variants: vec![
                        Variant {
                            label: "3mg".into(),
                            price: dec!(450),
                            discount_price: None,
                            stock: 1,
                        },
                        Variant {
                            label: "6mg".into(),
                            price: dec!(500),
                            discount_price: None,
                            stock: 10,
                        },
                    ],
                },
            })
            .unwrap();
        let ledger = InventoryLedger::new(storage.clone());
        (storage, ledger)
    }

    #[test]
    fn test_decrement_simple_product() {
        let (storage, ledger) = setup();
        assert_eq!(ledger.decrement("simple", None, 2).unwrap(), 3);
        assert_eq!(storage.get_product("simple").unwrap().unwrap().stock(None), Some(3));
    }

    #[test]
    fn test_decrement_is_variant_scoped() {
        let (storage, ledger) = setup();
        assert_eq!(ledger.decrement("mint", Some("6mg"), 4).unwrap(), 6);

        let p = storage.get_product("mint").unwrap().unwrap();
        assert_eq!(p.stock(Some("6mg")), Some(6));
        assert_eq!(p.stock(Some("3mg")), Some(1));
    }

    #[test]
    fn test_insufficient_stock_changes_nothing() {
        let (storage, ledger) = setup();
        let err = ledger.decrement("mint", Some("3mg"), 2).unwrap_err();
        match err {
            InventoryError::InsufficientStock {
                name,
                variant,
                requested,
                available,
                ..
            } => {
                assert_eq!(name, "Mint (3mg)");
                assert_eq!(variant.as_deref(), Some("3mg"));
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let p = storage.get_product("mint").unwrap().unwrap();
        assert_eq!(p.stock(Some("3mg")), Some(1));
    }

    #[test]
    fn test_scope_mismatch_is_variant_not_found() {
        let (_storage, ledger) = setup();
        assert!(matches!(
            ledger.decrement("mint", None, 1),
            Err(InventoryError::VariantNotFound { .. })
        ));
        let err = ledger.decrement("simple", Some("xl"), 1).unwrap_err();
        assert_eq!(err.to_string(), "Variant xl not found for Charger");
        assert!(matches!(
            ledger.decrement("ghost", None, 1),
            Err(InventoryError::ProductNotFound(_))
        ));
        assert!(matches!(
            ledger.decrement("simple", None, 0),
            Err(InventoryError::ZeroQuantity)
        ));
    }

    #[test]
    fn test_restock_roundtrip() {
        let (_storage, ledger) = setup();
        ledger.decrement("mint", Some("3mg"), 1).unwrap();
        assert_eq!(ledger.restock("mint", Some("3mg"), 1).unwrap(), 1);
        assert_eq!(ledger.restock("simple", None, 3).unwrap(), 8);
    }

    #[test]
    fn test_concurrent_decrements_never_oversell() {
        let (storage, ledger) = setup();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || ledger.decrement("simple", None, 1).is_ok())
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 5);
        assert_eq!(storage.get_product("simple").unwrap().unwrap().stock(None), Some(0));
    }
}
