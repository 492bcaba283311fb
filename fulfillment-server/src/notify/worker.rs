//! Notification Worker - drains the notification outbox
//!
//! Checkout writes one outbox entry per order inside its own transaction and
//! then pokes [`Notify`]. The worker delivers entries through a [`Notifier`],
//! retrying with exponential backoff; entries that keep failing move to the
//! dead letter table and are put back into the outbox on the next start.
//!
//! Delivery failures never reach the customer: the order is already
//! committed by the time the worker sees it.
//!
//! Note: redb operations are synchronous and short (single-row writes).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::notifier::{Notification, Notifier};
use crate::db::{OutboxEntry, Storage};

const MAX_RETRY_COUNT: u32 = 3;
const RETRY_BASE_DELAY_SECS: u64 = 5;
const RETRY_MAX_DELAY_SECS: u64 = 60;
const QUEUE_SCAN_INTERVAL_SECS: u64 = 30;

pub struct NotificationWorker {
    storage: Storage,
    notifier: Arc<dyn Notifier>,
    signal: Arc<Notify>,
    shutdown: CancellationToken,
}

impl NotificationWorker {
    pub fn new(
        storage: Storage,
        notifier: Arc<dyn Notifier>,
        signal: Arc<Notify>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            storage,
            notifier,
            signal,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!("NotificationWorker started");

        match self.storage.recover_dead_notifications() {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "Recovered dead notifications to outbox"),
            Err(e) => tracing::error!(error = %e, "Failed to recover dead notifications"),
        }

        self.process_outbox().await;

        let mut scan_interval = tokio::time::interval(Duration::from_secs(QUEUE_SCAN_INTERVAL_SECS));
        loop {
            tokio::select! {
                _ = self.signal.notified() => {}
                _ = scan_interval.tick() => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("NotificationWorker received shutdown signal");
                    return;
                }
            }
            self.process_outbox().await;
        }
    }

    /// Attempt every due entry once; returns the number delivered
    pub async fn process_outbox(&self) -> usize {
        let pending = match self.storage.get_pending_notifications() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read notification outbox");
                return 0;
            }
        };

        let now = shared::util::now_millis();
        let mut delivered = 0;
        for entry in pending {
            if self.should_attempt(&entry, now) && self.deliver(&entry).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Backoff gate; also dead-letters entries past the retry budget
    fn should_attempt(&self, entry: &OutboxEntry, now: i64) -> bool {
        if entry.retry_count >= MAX_RETRY_COUNT {
            let error = entry.last_error.as_deref().unwrap_or("Unknown error");
            tracing::error!(
                entry_id = entry.id,
                order_id = %entry.order_id,
                retry_count = entry.retry_count,
                last_error = %error,
                "Max retry count exceeded, moving notification to dead letter table"
            );
            if let Err(e) = self.storage.move_notification_to_dead_letter(entry.id, error) {
                tracing::error!(entry_id = entry.id, error = %e, "Failed to dead-letter notification");
            }
            return false;
        }
        match entry.last_attempt_at {
            None => true,
            Some(last) => now >= last + retry_delay_ms(entry.retry_count),
        }
    }

    async fn deliver(&self, entry: &OutboxEntry) -> bool {
        match self.notifier.notify(&Notification::from(entry)).await {
            Ok(()) => {
                tracing::debug!(entry_id = entry.id, order_id = %entry.order_id, "Notification delivered");
                if let Err(e) = self.storage.complete_notification(entry.id) {
                    tracing::error!(entry_id = entry.id, error = %e, "Failed to remove delivered notification");
                }
                true
            }
            Err(e) => {
                tracing::warn!(
                    entry_id = entry.id,
                    order_id = %entry.order_id,
                    retry_count = entry.retry_count,
                    error = %e,
                    "Notification delivery failed"
                );
                if let Err(e2) = self.storage.mark_notification_failed(entry.id, &e.to_string()) {
                    tracing::error!(entry_id = entry.id, error = %e2, "Failed to record notification failure");
                }
                false
            }
        }
    }
}

/// Exponential backoff: base * 2^retry, capped at max
fn retry_delay_ms(retry_count: u32) -> i64 {
    let secs = RETRY_BASE_DELAY_SECS
        .saturating_mul(2u64.saturating_pow(retry_count))
        .min(RETRY_MAX_DELAY_SECS);
    secs as i64 * 1000
}
