//! 物流追踪轮询
//!
//! Periodically refreshes tracking for every order whose shipment is booked
//! and whose fulfillment is not yet terminal. Registered as
//! `TaskKind::Periodic`; an interval of zero disables it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::gateway::ShipmentService;

/// Pause between two carrier calls inside one sweep
const PER_ORDER_DELAY_MS: u64 = 200;

pub struct TrackingPoller {
    shipments: ShipmentService,
    interval: Duration,
    shutdown: CancellationToken,
}

impl TrackingPoller {
    pub fn new(shipments: ShipmentService, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            shipments,
            interval,
            shutdown,
        }
    }

    /// Main loop: sleep → sweep, until shutdown
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Tracking poller started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Tracking poller received shutdown signal");
                    return;
                }
            }
            self.sweep().await;
        }
    }

    /// Refresh every trackable order once; returns how many refreshed cleanly
    pub async fn sweep(&self) -> usize {
        let orders = match self.shipments.trackable_orders() {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list trackable orders");
                return 0;
            }
        };
        if orders.is_empty() {
            return 0;
        }

        tracing::debug!(count = orders.len(), "Refreshing tracking");
        let mut refreshed = 0;
        for order in orders {
            if self.shutdown.is_cancelled() {
                break;
            }
            match self.shipments.refresh_tracking(&order.id).await {
                Ok(update) => {
                    refreshed += 1;
                    tracing::debug!(
                        order_id = %order.id,
                        raw_status = %update.raw_status,
                        fulfillment = %update.fulfillment_status,
                        "Tracking refreshed"
                    );
                }
                Err(e) => tracing::warn!(order_id = %order.id, error = %e, "Tracking refresh failed"),
            }
            tokio::time::sleep(Duration::from_millis(PER_ORDER_DELAY_MS)).await;
        }
        refreshed
    }
}
