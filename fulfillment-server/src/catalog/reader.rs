//! Catalog snapshot reader
//!
//! Read-only product lookup for checkout. What it returns is a snapshot:
//! stock may change before the order commits, which is why the inventory
//! ledger re-checks it atomically inside the order transaction.

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Pricing, Product};
use std::path::Path;
use thiserror::Error;

use crate::db::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Invalid catalog file: {0}")]
    InvalidSeed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, format!("Product {} not found", id))
                    .with_detail("product_id", id)
            }
            CatalogError::InvalidSeed(msg) => AppError::with_message(ErrorCode::ConfigError, msg),
            CatalogError::Storage(e) => e.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogSeed {
    products: Vec<Product>,
}

/// Read-only view of the product catalog
#[derive(Debug, Clone)]
pub struct CatalogReader {
    storage: Storage,
}

impl CatalogReader {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Current product snapshot
    pub fn resolve(&self, product_id: &str) -> Result<Product, CatalogError> {
        self.storage
            .get_product(product_id)?
            .ok_or_else(|| CatalogError::ProductNotFound(product_id.to_string()))
    }

    /// Load products from a JSON seed file (`{"products": [...]}`)
    ///
    /// Existing products are left untouched so restarting never resets stock.
    /// Returns the number of newly inserted products.
    pub fn seed_from_file(&self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::InvalidSeed(format!("{}: {}", path.display(), e)))?;
        let seed: CatalogSeed = serde_json::from_str(&raw)
            .map_err(|e| CatalogError::InvalidSeed(format!("{}: {}", path.display(), e)))?;

        let mut inserted = 0;
        for product in &seed.products {
            validate_seed_product(product)?;
            if self.storage.insert_product_if_absent(product)? {
                inserted += 1;
            }
        }
        tracing::info!(
            file = %path.display(),
            total = seed.products.len(),
            inserted,
            "Catalog seed loaded"
        );
        Ok(inserted)
    }
}

fn validate_seed_product(product: &Product) -> Result<(), CatalogError> {
    let invalid = |reason: &str| {
        Err(CatalogError::InvalidSeed(format!(
            "product {}: {}",
            product.id, reason
        )))
    };
    if product.id.trim().is_empty() {
        return invalid("empty id");
    }
    match &product.pricing {
        Pricing::Simple { price, .. } if price.is_sign_negative() => invalid("negative price"),
        Pricing::Variants { variants } if variants.is_empty() => invalid("no variants"),
        Pricing::Variants { variants } if variants.iter().any(|v| v.price.is_sign_negative()) => {
            invalid("negative variant price")
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_missing_product() {
        let reader = CatalogReader::new(Storage::open_in_memory().unwrap());
        let err = reader.resolve("nope").unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(ref id) if id == "nope"));

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::ProductNotFound);
    }

    #[test]
    fn test_seed_does_not_overwrite_existing_stock() {
        let storage = Storage::open_in_memory().unwrap();
        let reader = CatalogReader::new(storage.clone());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"products":[
                {{"id":"p-1","name":"Charger","pricing":{{"kind":"SIMPLE","price":"500","stock":5}}}},
                {{"id":"p-2","name":"Mint","pricing":{{"kind":"VARIANTS","variants":[
                    {{"label":"6mg","price":"450","stock":2}}]}}}}
            ]}}"#
        )
        .unwrap();

        assert_eq!(reader.seed_from_file(file.path()).unwrap(), 2);

        // simulate sales, then reseed
        let mut p = reader.resolve("p-1").unwrap();
        *p.stock_mut(None).unwrap() = 1;
        storage.put_product(&p).unwrap();

        assert_eq!(reader.seed_from_file(file.path()).unwrap(), 0);
        assert_eq!(reader.resolve("p-1").unwrap().stock(None), Some(1));
        assert_eq!(reader.resolve("p-2").unwrap().stock(Some("6mg")), Some(2));
    }

    #[test]
    fn test_seed_rejects_variant_product_without_variants() {
        let reader = CatalogReader::new(Storage::open_in_memory().unwrap());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"products":[{{"id":"p-9","name":"Empty","pricing":{{"kind":"VARIANTS","variants":[]}}}}]}}"#
        )
        .unwrap();
        assert!(matches!(
            reader.seed_from_file(file.path()),
            Err(CatalogError::InvalidSeed(_))
        ));
    }
}
