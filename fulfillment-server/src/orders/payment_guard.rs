//! Payment reference guard
//!
//! A prepaid order is backed by a bank transfer reference (UTR). Each
//! reference may back at most one order, ever. The format check runs before
//! storage is touched; uniqueness is an insert-if-absent on the
//! `payment_references` table inside the order's write transaction.

use redb::WriteTransaction;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::{PaymentReferenceRecord, Storage, StorageError};

pub const MIN_PAYMENT_REFERENCE_LEN: usize = 8;
pub const MAX_PAYMENT_REFERENCE_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum PaymentReferenceError {
    #[error("Payment reference must be {min}-{max} letters or digits")]
    Invalid { min: usize, max: usize },

    #[error("Payment reference {token} has already been used")]
    AlreadyUsed { token: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<PaymentReferenceError> for AppError {
    fn from(err: PaymentReferenceError) -> Self {
        let message = err.to_string();
        match err {
            PaymentReferenceError::Invalid { min, max } => {
                AppError::with_message(ErrorCode::InvalidPaymentReference, message)
                    .with_detail("min_length", min)
                    .with_detail("max_length", max)
            }
            // the owning order is deliberately not exposed to the customer
            PaymentReferenceError::AlreadyUsed { token } => {
                AppError::with_message(ErrorCode::DuplicatePaymentReference, message)
                    .with_detail("payment_reference", token)
            }
            PaymentReferenceError::Storage(e) => e.into(),
        }
    }
}

/// Canonical form of a payment reference: trimmed, uppercase, alphanumeric
pub fn normalize_reference(raw: &str) -> Result<String, PaymentReferenceError> {
    let token = raw.trim();
    let valid_len = (MIN_PAYMENT_REFERENCE_LEN..=MAX_PAYMENT_REFERENCE_LEN).contains(&token.len());
    if !valid_len || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PaymentReferenceError::Invalid {
            min: MIN_PAYMENT_REFERENCE_LEN,
            max: MAX_PAYMENT_REFERENCE_LEN,
        });
    }
    Ok(token.to_ascii_uppercase())
}

/// Single-use enforcement for payment references
#[derive(Debug, Clone)]
pub struct PaymentGuard {
    storage: Storage,
}

impl PaymentGuard {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Consume a normalized token on behalf of `order_id`
    ///
    /// Must run inside the order's write transaction and before any stock is
    /// touched. Nothing is written when the token already exists.
    pub fn consume_txn(
        &self,
        txn: &WriteTransaction,
        token: &str,
        order_id: &str,
    ) -> Result<(), PaymentReferenceError> {
        let record = PaymentReferenceRecord {
            token: token.to_string(),
            order_id: order_id.to_string(),
            created_at: shared::util::now_millis(),
        };
        if self.storage.insert_payment_reference_txn(txn, &record)? {
            Ok(())
        } else {
            let owner = self
                .storage
                .get_payment_reference_txn(txn, token)?
                .map(|r| r.order_id);
            tracing::warn!(
                payment_reference = %token,
                order_id = %order_id,
                owner = ?owner,
                "Rejected reused payment reference"
            );
            Err(PaymentReferenceError::AlreadyUsed {
                token: token.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reference() {
        assert_eq!(normalize_reference("  utr12345678 ").unwrap(), "UTR12345678");
        assert_eq!(normalize_reference("12345678").unwrap(), "12345678");

        for bad in ["", "1234567", "UTR-1234-5678", "UTR 12345678", &"9".repeat(33)] {
            assert!(
                matches!(normalize_reference(bad), Err(PaymentReferenceError::Invalid { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_consume_once() {
        let storage = Storage::open_in_memory().unwrap();
        let guard = PaymentGuard::new(storage.clone());

        let txn = storage.begin_write().unwrap();
        guard.consume_txn(&txn, "UTR12345678", "o-1").unwrap();
        txn.commit().unwrap();
        assert_eq!(
            storage.get_payment_reference("UTR12345678").unwrap().unwrap().order_id,
            "o-1"
        );

        let txn = storage.begin_write().unwrap();
        let err = guard.consume_txn(&txn, "UTR12345678", "o-2").unwrap_err();
        txn.abort().unwrap();
        assert!(matches!(err, PaymentReferenceError::AlreadyUsed { .. }));

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::DuplicatePaymentReference);
    }

    #[test]
    fn test_aborted_consume_frees_token() {
        let storage = Storage::open_in_memory().unwrap();
        let guard = PaymentGuard::new(storage.clone());

        let txn = storage.begin_write().unwrap();
        guard.consume_txn(&txn, "UTR87654321", "o-1").unwrap();
        txn.abort().unwrap();

        assert!(storage.get_payment_reference("UTR87654321").unwrap().is_none());
    }
}
