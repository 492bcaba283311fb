//! Shipment service
//!
//! Drives the shipment status machine from carrier responses:
//!
//! ```text
//!            create ok
//! Pending ─────────────→ Created ──tracking──→ fulfillment Packed/InTransit/Delivered
//!    │ ↑
//!    │ └── reset (admin)
//!    ↓ create failed
//! Failed
//! ```
//!
//! A carrier failure only touches the shipment fields; fulfillment is never
//! moved by a failed booking. Every booking attempt is appended to the
//! order's attempt history.
//!
//! Carrier calls are awaited with no write transaction open and are bounded
//! by the carrier timeout. The result is recorded afterwards in a short
//! transaction that re-reads the order. A booking runs in its own task, so a
//! caller that goes away (client disconnect, request timeout) cannot leave a
//! carrier call without its recorded outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use redb::WriteTransaction;
use shared::order::{FulfillmentStatus, Order, ShipmentStatus, StatusMachine, Transition};
use shared::shipment::{
    AttemptOutcome, CreateShipmentRequest, NormalizedStatus, ShipmentAttempt, ShipmentRef,
    TrackingInfo, TrackingUpdate, Warehouse,
};
use shared::util::now_millis;

use super::carrier::{CarrierApi, CarrierShipmentRequest, GatewayError};

/// Upper bound for one carrier call unless configured otherwise
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
use super::error::{ShipmentError, ShipmentResult};
use super::normalizer::normalize;
use crate::db::{Storage, StorageError};

#[derive(Clone)]
pub struct ShipmentService {
    storage: Storage,
    carrier: Option<Arc<dyn CarrierApi>>,
    call_timeout: Duration,
    /// Orders with a booking request currently awaiting the carrier
    in_flight: Arc<DashSet<String>>,
}

impl std::fmt::Debug for ShipmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipmentService")
            .field("carrier_configured", &self.carrier.is_some())
            .field("call_timeout", &self.call_timeout)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

/// Removes the order from the in-flight set when the booking finishes
struct InFlightGuard {
    set: Arc<DashSet<String>>,
    order_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.order_id);
    }
}

impl ShipmentService {
    pub fn new(storage: Storage, carrier: Option<Arc<dyn CarrierApi>>) -> Self {
        Self {
            storage,
            carrier,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Bound every carrier call; an expired call counts as [`GatewayError::Timeout`]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout))
    }

    pub fn carrier_configured(&self) -> bool {
        self.carrier.is_some()
    }

    fn carrier(&self) -> ShipmentResult<&Arc<dyn CarrierApi>> {
        self.carrier.as_ref().ok_or(ShipmentError::CarrierNotConfigured)
    }

    fn load(&self, order_id: &str) -> ShipmentResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| ShipmentError::OrderNotFound(order_id.to_string()))
    }

    /// Book a shipment with the carrier
    ///
    /// An order whose shipment is already `Created` is returned unchanged
    /// without calling the carrier. A `Failed` shipment must be reset first.
    ///
    /// The carrier call and the recording of its outcome run in a spawned
    /// task; dropping this future does not cancel them.
    pub async fn create_shipment(
        &self,
        order_id: &str,
        req: &CreateShipmentRequest,
    ) -> ShipmentResult<Order> {
        let carrier = self.carrier()?.clone();

        let warehouse_id = req.warehouse_id.trim();
        if warehouse_id.is_empty() {
            return Err(ShipmentError::MissingWarehouse);
        }
        let invalid = req.package.non_positive_fields();
        if !invalid.is_empty() {
            return Err(ShipmentError::InvalidPackage(invalid));
        }

        if !self.in_flight.insert(order_id.to_string()) {
            return Err(ShipmentError::InProgress(order_id.to_string()));
        }
        let guard = InFlightGuard {
            set: self.in_flight.clone(),
            order_id: order_id.to_string(),
        };

        let order = self.load(order_id)?;
        if matches!(
            order.fulfillment_status,
            FulfillmentStatus::Cancelled | FulfillmentStatus::Delivered
        ) {
            return Err(ShipmentError::NotShippable {
                order_id: order.id,
                status: order.fulfillment_status.to_string(),
            });
        }
        if order.shipment_status.transition(ShipmentStatus::Created)? == Transition::Unchanged {
            tracing::info!(order_id = %order.id, "Shipment already created, skipping carrier call");
            return Ok(order);
        }

        let payload = CarrierShipmentRequest::from_order(&order, warehouse_id, &req.package);
        tracing::info!(order_id = %order.id, warehouse_id = %warehouse_id, "Booking shipment");

        let service = self.clone();
        let warehouse_id = warehouse_id.to_string();
        let booking = tokio::spawn(async move {
            let _guard = guard;
            service
                .book(carrier.as_ref(), &order.id, &warehouse_id, &payload)
                .await
        });
        booking.await.map_err(|e| {
            tracing::error!(order_id = %order_id, error = %e, "Shipment booking task failed");
            ShipmentError::BookingTask(e.to_string())
        })?
    }

    async fn book(
        &self,
        carrier: &dyn CarrierApi,
        order_id: &str,
        warehouse_id: &str,
        payload: &CarrierShipmentRequest,
    ) -> ShipmentResult<Order> {
        match self.bounded(carrier.create_shipment(payload)).await {
            Ok(shipment) => self.record_booking(order_id, warehouse_id, shipment),
            Err(e) => {
                self.record_booking_failure(order_id, warehouse_id, &e)?;
                Err(e.into())
            }
        }
    }

    fn record_booking(
        &self,
        order_id: &str,
        warehouse_id: &str,
        shipment: ShipmentRef,
    ) -> ShipmentResult<Order> {
        let order = self.update_order(order_id, |txn, order| {
            order.shipment_status.transition(ShipmentStatus::Created)?;
            order.shipment_status = ShipmentStatus::Created;
            order.shipment_reference_id = Some(shipment.shipment_id.clone());
            order.tracking_number = Some(shipment.tracking_number.clone());
            if shipment.courier_name.is_some() {
                order.courier_name = shipment.courier_name.clone();
            }
            order.last_shipment_error = None;

            self.append_attempt_txn(
                txn,
                ShipmentAttempt {
                    order_id: order.id.clone(),
                    attempt: 0,
                    warehouse_id: warehouse_id.to_string(),
                    outcome: AttemptOutcome::Created,
                    shipment_id: Some(shipment.shipment_id.clone()),
                    tracking_number: Some(shipment.tracking_number.clone()),
                    error: None,
                    raw_excerpt: None,
                    created_at: now_millis(),
                },
            )
        })?;
        tracing::info!(
            order_id = %order_id,
            shipment_id = %shipment.shipment_id,
            awb = %shipment.tracking_number,
            "Shipment created"
        );
        Ok(order)
    }

    fn record_booking_failure(
        &self,
        order_id: &str,
        warehouse_id: &str,
        error: &GatewayError,
    ) -> ShipmentResult<Order> {
        tracing::warn!(
            order_id = %order_id,
            error = %error,
            raw_excerpt = ?error.raw_excerpt(),
            "Shipment booking failed"
        );
        self.update_order(order_id, |txn, order| {
            if order.shipment_status.transition(ShipmentStatus::Failed)? == Transition::Applied {
                order.shipment_status = ShipmentStatus::Failed;
            }
            order.last_shipment_error = Some(error.to_string());

            self.append_attempt_txn(
                txn,
                ShipmentAttempt {
                    order_id: order.id.clone(),
                    attempt: 0,
                    warehouse_id: warehouse_id.to_string(),
                    outcome: AttemptOutcome::Failed,
                    shipment_id: None,
                    tracking_number: None,
                    error: Some(error.to_string()),
                    raw_excerpt: error.raw_excerpt().map(str::to_string),
                    created_at: now_millis(),
                },
            )
        })
    }

    fn append_attempt_txn(
        &self,
        txn: &WriteTransaction,
        mut attempt: ShipmentAttempt,
    ) -> ShipmentResult<()> {
        attempt.attempt = self.storage.next_attempt_number_txn(txn, &attempt.order_id)?;
        self.storage.append_shipment_attempt_txn(txn, &attempt)?;
        Ok(())
    }

    /// Return a failed shipment to `Pending` so it can be booked again
    pub fn reset_shipment(&self, order_id: &str) -> ShipmentResult<Order> {
        self.update_order(order_id, |_, order| {
            if order.shipment_status.transition(ShipmentStatus::Pending)? == Transition::Applied {
                order.shipment_status = ShipmentStatus::Pending;
                tracing::info!(order_id = %order.id, "Shipment reset for retry");
            }
            Ok(())
        })
    }

    /// Pickup locations known to the carrier
    pub async fn list_warehouses(&self) -> ShipmentResult<Vec<Warehouse>> {
        let carrier = self.carrier()?;
        Ok(self.bounded(carrier.list_warehouses()).await?)
    }

    pub fn list_attempts(&self, order_id: &str) -> ShipmentResult<Vec<ShipmentAttempt>> {
        self.load(order_id)?;
        Ok(self.storage.list_shipment_attempts(order_id)?)
    }

    /// Pull the carrier's tracking status and apply it to the order
    ///
    /// Recognized statuses move fulfillment forward through each legal step;
    /// a status behind the current one is ignored. Cancelled orders only get
    /// their tracking fields refreshed.
    pub async fn refresh_tracking(&self, order_id: &str) -> ShipmentResult<TrackingUpdate> {
        let carrier = self.carrier()?.clone();
        let order = self.load(order_id)?;
        let awb = order
            .tracking_number
            .clone()
            .ok_or_else(|| ShipmentError::NotCreated(order_id.to_string()))?;

        let info = self.bounded(carrier.track(&awb)).await?;
        let normalized = normalize(&info.raw_status);

        let order = self.update_order(order_id, |_, order| {
            apply_tracking(order, &info, &normalized);
            Ok(())
        })?;

        if let NormalizedStatus::Unrecognized(status) = &normalized {
            let seen = self.storage.record_unrecognized_status(status)?;
            tracing::warn!(
                order_id = %order_id,
                raw_status = %info.raw_status,
                seen,
                "Unrecognized carrier status"
            );
        }

        Ok(TrackingUpdate {
            order_id: order.id,
            raw_status: info.raw_status,
            normalized,
            fulfillment_status: order.fulfillment_status,
            expected_delivery_date: order.expected_delivery_date,
            courier_name: order.courier_name,
        })
    }

    /// Orders the tracking poller should refresh
    pub fn trackable_orders(&self) -> ShipmentResult<Vec<Order>> {
        Ok(self.storage.find_orders(|o| {
            o.shipment_status == ShipmentStatus::Created
                && o.tracking_number.is_some()
                && !o.fulfillment_status.is_terminal()
        })?)
    }

    /// Load, mutate and commit one order
    fn update_order<F>(&self, order_id: &str, apply: F) -> ShipmentResult<Order>
    where
        F: FnOnce(&WriteTransaction, &mut Order) -> ShipmentResult<()>,
    {
        let txn = self.storage.begin_write()?;
        let result = (|| -> ShipmentResult<Order> {
            let mut order = self
                .storage
                .get_order_txn(&txn, order_id)?
                .ok_or_else(|| ShipmentError::OrderNotFound(order_id.to_string()))?;
            apply(&txn, &mut order)?;
            order.updated_at = now_millis();
            self.storage.put_order_txn(&txn, &order)?;
            Ok(order)
        })();
        match result {
            Ok(order) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(order)
            }
            Err(e) => {
                txn.abort().map_err(StorageError::from)?;
                Err(e)
            }
        }
    }
}

/// Copy carrier tracking data onto the order and advance fulfillment
fn apply_tracking(order: &mut Order, info: &TrackingInfo, normalized: &NormalizedStatus) {
    order.last_carrier_status = Some(info.raw_status.clone());
    if info.expected_delivery_date.is_some() {
        order.expected_delivery_date = info.expected_delivery_date.clone();
    }
    if info.courier_name.is_some() {
        order.courier_name = info.courier_name.clone();
    }

    let Some(canonical) = normalized.canonical() else {
        return;
    };
    if order.fulfillment_status == FulfillmentStatus::Cancelled {
        tracing::warn!(order_id = %order.id, carrier_status = %canonical, "Carrier update for cancelled order ignored");
        return;
    }

    let target = canonical.fulfillment_target();
    let steps = order.fulfillment_status.steps_toward(target);
    if steps.is_empty() {
        tracing::debug!(order_id = %order.id, current = %order.fulfillment_status, carrier = %canonical, "No fulfillment change");
        return;
    }
    for step in steps {
        tracing::info!(order_id = %order.id, from = %order.fulfillment_status, to = %step, "Fulfillment advanced by carrier");
        order.fulfillment_status = step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::carrier::mock::MockCarrier;
    use rust_decimal_macros::dec;
    use shared::order::{CustomerSnapshot, OrderLine, PaymentMode, PaymentStatus};
    use shared::shipment::{CanonicalStatus, PackageDimensions};

    fn order(id: &str) -> Order {
        Order {
            id: id.into(),
            customer: CustomerSnapshot {
                name: "Meera".into(),
                phone: "9000000003".into(),
                email: None,
                address_line1: "8 Residency Road".into(),
                address_line2: None,
                city: "Bengaluru".into(),
                state: "KA".into(),
                pincode: "560025".into(),
            },
            lines: vec![OrderLine {
                product_id: "pod".into(),
                product_name: "Pod".into(),
                variant_label: None,
                quantity: 2,
                unit_price: dec!(500),
            }],
            subtotal: dec!(1000),
            delivery_fee: dec!(100),
            total: dec!(1100),
            payment_mode: PaymentMode::Cod,
            payment_reference: None,
            payment_status: PaymentStatus::Cod,
            fulfillment_status: FulfillmentStatus::Pending,
            shipment_status: ShipmentStatus::Pending,
            shipment_reference_id: None,
            tracking_number: None,
            courier_name: None,
            expected_delivery_date: None,
            last_carrier_status: None,
            last_shipment_error: None,
            created_at: 1_760_000_000_000,
            updated_at: 1_760_000_000_000,
        }
    }

    fn storage_with(order: &Order) -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.insert_order_txn(&txn, order).unwrap();
        txn.commit().unwrap();
        storage
    }

    fn request() -> CreateShipmentRequest {
        CreateShipmentRequest {
            warehouse_id: "WH-1".into(),
            package: PackageDimensions {
                weight_kg: dec!(0.5),
                length_cm: dec!(10),
                breadth_cm: dec!(10),
                height_cm: dec!(5),
            },
        }
    }

    fn booked() -> ShipmentRef {
        ShipmentRef {
            shipment_id: "SHP-1".into(),
            tracking_number: "AWB-1".into(),
            courier_name: Some("Delhivery".into()),
        }
    }

    #[tokio::test]
    async fn test_successful_booking() {
        let storage = storage_with(&order("o-1"));
        let carrier = Arc::new(MockCarrier::booking(Ok(booked())));
        let service = ShipmentService::new(storage.clone(), Some(carrier.clone()));

        let updated = service.create_shipment("o-1", &request()).await.unwrap();
        assert_eq!(updated.shipment_status, ShipmentStatus::Created);
        assert_eq!(updated.tracking_number.as_deref(), Some("AWB-1"));
        assert_eq!(updated.shipment_reference_id.as_deref(), Some("SHP-1"));
        assert_eq!(updated.fulfillment_status, FulfillmentStatus::Pending);

        let sent = carrier.requests.lock().unwrap();
        assert_eq!(sent[0].order_items[0].units, 2);
        assert_eq!(sent[0].payment_method, "COD");
        // goods value only; the delivery fee is not part of it
        assert_eq!(sent[0].sub_total, dec!(1000));
        drop(sent);

        // second call must not book again
        let again = service.create_shipment("o-1", &request()).await.unwrap();
        assert_eq!(again.tracking_number.as_deref(), Some("AWB-1"));
        assert_eq!(carrier.requests.lock().unwrap().len(), 1);

        let attempts = service.list_attempts("o-1").unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].outcome, AttemptOutcome::Created);
    }

    #[tokio::test]
    async fn test_failed_booking_keeps_fulfillment() {
        let storage = storage_with(&order("o-2"));
        let carrier = Arc::new(MockCarrier::booking(Err(GatewayError::NonJson {
            status: 502,
            excerpt: "<html>bad gateway</html>".into(),
        })));
        let service = ShipmentService::new(storage.clone(), Some(carrier));

        let err = service.create_shipment("o-2", &request()).await.unwrap_err();
        assert!(matches!(err, ShipmentError::Gateway(GatewayError::NonJson { .. })));

        let stored = storage.get_order("o-2").unwrap().unwrap();
        assert_eq!(stored.shipment_status, ShipmentStatus::Failed);
        assert_eq!(stored.fulfillment_status, FulfillmentStatus::Pending);
        assert!(stored.last_shipment_error.is_some());

        let attempts = service.list_attempts("o-2").unwrap();
        assert_eq!(attempts[0].outcome, AttemptOutcome::Failed);
        assert_eq!(attempts[0].raw_excerpt.as_deref(), Some("<html>bad gateway</html>"));

        // booking again requires a reset first
        assert!(matches!(
            service.create_shipment("o-2", &request()).await,
            Err(ShipmentError::InvalidTransition(_))
        ));
        let reset = service.reset_shipment("o-2").unwrap();
        assert_eq!(reset.shipment_status, ShipmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let storage = storage_with(&order("o-3"));
        let service = ShipmentService::new(storage.clone(), Some(Arc::new(MockCarrier::default())));

        let mut req = request();
        req.package.weight_kg = dec!(0);
        assert!(matches!(
            service.create_shipment("o-3", &req).await,
            Err(ShipmentError::InvalidPackage(fields)) if fields == vec!["weight_kg"]
        ));
        assert!(matches!(
            service.create_shipment("missing", &request()).await,
            Err(ShipmentError::OrderNotFound(_))
        ));

        let unconfigured = ShipmentService::new(storage, None);
        assert!(matches!(
            unconfigured.create_shipment("o-3", &request()).await,
            Err(ShipmentError::CarrierNotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_tracking_advances_without_regressing() {
        let mut o = order("o-4");
        o.shipment_status = ShipmentStatus::Created;
        o.tracking_number = Some("AWB-4".into());
        let storage = storage_with(&o);
        let carrier = Arc::new(MockCarrier::default());
        carrier.push_tracking("Out For Delivery");
        carrier.push_tracking("Pickup Scheduled");
        carrier.push_tracking("DELIVERED");
        let service = ShipmentService::new(storage.clone(), Some(carrier));

        let update = service.refresh_tracking("o-4").await.unwrap();
        assert_eq!(update.normalized, NormalizedStatus::Canonical(CanonicalStatus::OutForDelivery));
        assert_eq!(update.fulfillment_status, FulfillmentStatus::InTransit);
        assert_eq!(update.courier_name.as_deref(), Some("BlueDart"));

        let update = service.refresh_tracking("o-4").await.unwrap();
        assert_eq!(update.fulfillment_status, FulfillmentStatus::InTransit);

        let update = service.refresh_tracking("o-4").await.unwrap();
        assert_eq!(update.fulfillment_status, FulfillmentStatus::Delivered);
        assert!(service.trackable_orders().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_counted() {
        let mut o = order("o-5");
        o.shipment_status = ShipmentStatus::Created;
        o.tracking_number = Some("AWB-5".into());
        let storage = storage_with(&o);
        let carrier = Arc::new(MockCarrier::default());
        carrier.push_tracking("foo-bar-99");
        let service = ShipmentService::new(storage.clone(), Some(carrier));

        let update = service.refresh_tracking("o-5").await.unwrap();
        assert_eq!(update.normalized, NormalizedStatus::Unrecognized("foo bar 99".into()));
        assert_eq!(update.fulfillment_status, FulfillmentStatus::Pending);

        let stored = storage.get_order("o-5").unwrap().unwrap();
        assert_eq!(stored.last_carrier_status.as_deref(), Some("foo-bar-99"));
        assert_eq!(storage.list_unrecognized_statuses().unwrap()[0].count, 1);
    }

    #[tokio::test]
    async fn test_tracking_requires_awb() {
        let storage = storage_with(&order("o-6"));
        let service = ShipmentService::new(storage, Some(Arc::new(MockCarrier::default())));
        assert!(matches!(
            service.refresh_tracking("o-6").await,
            Err(ShipmentError::NotCreated(_))
        ));
    }

    /// Carrier that accepts the connection and never answers
    struct StalledCarrier;

    #[async_trait::async_trait]
    impl CarrierApi for StalledCarrier {
        async fn create_shipment(&self, _req: &CarrierShipmentRequest) -> Result<ShipmentRef, GatewayError> {
            std::future::pending().await
        }

        async fn list_warehouses(&self) -> Result<Vec<Warehouse>, GatewayError> {
            std::future::pending().await
        }

        async fn track(&self, _awb: &str) -> Result<TrackingInfo, GatewayError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_booking_is_recorded_as_failed() {
        let storage = storage_with(&order("o-8"));
        let service = ShipmentService::new(storage.clone(), Some(Arc::new(StalledCarrier)))
            .with_call_timeout(Duration::from_millis(200));

        // the caller gives up well before the carrier timeout
        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            service.create_shipment("o-8", &request()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;

        let stored = storage.get_order("o-8").unwrap().unwrap();
        assert_eq!(stored.shipment_status, ShipmentStatus::Failed);
        assert_eq!(stored.fulfillment_status, FulfillmentStatus::Pending);
        assert_eq!(
            stored.last_shipment_error.as_deref(),
            Some("Carrier request timed out")
        );

        let attempts = service.list_attempts("o-8").unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].outcome, AttemptOutcome::Failed);

        // in-flight marker released: the next try hits the state machine, not InProgress
        assert!(matches!(
            service.create_shipment("o-8", &request()).await,
            Err(ShipmentError::InvalidTransition(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tracking_times_out() {
        let mut o = order("o-9");
        o.shipment_status = ShipmentStatus::Created;
        o.tracking_number = Some("AWB-9".into());
        let storage = storage_with(&o);
        let service = ShipmentService::new(storage, Some(Arc::new(StalledCarrier)))
            .with_call_timeout(Duration::from_millis(100));

        assert!(matches!(
            service.refresh_tracking("o-9").await,
            Err(ShipmentError::Gateway(GatewayError::Timeout))
        ));
        assert!(matches!(
            service.list_warehouses().await,
            Err(ShipmentError::Gateway(GatewayError::Timeout))
        ));
    }

    #[test]
    fn test_cancelled_order_ignores_carrier() {
        let mut o = order("o-7");
        o.fulfillment_status = FulfillmentStatus::Cancelled;
        let info = TrackingInfo {
            raw_status: "Delivered".into(),
            expected_delivery_date: None,
            courier_name: None,
        };
        apply_tracking(&mut o, &info, &normalize(&info.raw_status));
        assert_eq!(o.fulfillment_status, FulfillmentStatus::Cancelled);
        assert_eq!(o.last_carrier_status.as_deref(), Some("Delivered"));
    }
}
