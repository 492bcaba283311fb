//! 承运商客户端测试 - 本地 axum 桩服务驱动真实的 reqwest 客户端

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fulfillment_server::OrderLedger;
use fulfillment_server::db::Storage;
use fulfillment_server::shipment::{
    CarrierApi, CarrierShipmentRequest, GatewayError, HttpCarrierClient, ShipmentError,
    ShipmentService,
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use shared::models::{Pricing, Product};
use shared::order::{
    CheckoutItem, CheckoutRequest, CustomerSnapshot, FulfillmentStatus, PaymentMode, ShipmentStatus,
};
use shared::shipment::{AttemptOutcome, CreateShipmentRequest, PackageDimensions};
use std::collections::HashMap;
use tokio::net::TcpListener;
use tokio::sync::Notify;

const API_KEY: &str = "test-key";

async fn create_shipment(Path(mode): Path<String>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad key"}))).into_response();
    }
    match mode.as_str() {
        "ok" => Json(json!({
            "status": 200,
            "data": {
                "shipment_id": 98765,
                "awb_code": format!("AWB-{}", body["order_id"].as_str().unwrap_or_default()),
                "courier_name": "BlueDart"
            }
        }))
        .into_response(),
        "html" => (
            StatusCode::BAD_GATEWAY,
            Html(format!("<html><body>{}</body></html>", "upstream error ".repeat(40))),
        )
            .into_response(),
        "flag" => Json(json!({"success": false, "message": "Pincode not serviceable"})).into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({})).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_warehouses() -> Json<Value> {
    Json(json!({"data": [
        {"id": 1, "name": "Main", "city": "Pune", "pincode": "411001"},
        {"pickup_location": "Backup"}
    ]}))
}

async fn track(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({"tracking_data": {
        "awb": query.get("awb"),
        "current_status": "Out For Delivery",
        "etd": "2026-10-25"
    }}))
}

/// Start the stub carrier and return its base URL (without mode)
async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/{mode}/create-shipment", post(create_shipment))
        .route("/{mode}/list-warehouses", get(list_warehouses))
        .route("/{mode}/track-order", get(track));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str, mode: &str, timeout: Duration) -> HttpCarrierClient {
    HttpCarrierClient::new(&format!("{base}/{mode}/"), API_KEY, timeout).unwrap()
}

fn package() -> PackageDimensions {
    PackageDimensions {
        weight_kg: dec!(0.5),
        length_cm: dec!(10),
        breadth_cm: dec!(10),
        height_cm: dec!(5),
    }
}

/// Storage with one committed COD order; returns (storage, order id)
fn placed_order() -> (Storage, String) {
    let storage = Storage::open_in_memory().unwrap();
    storage
        .put_product(&Product {
            id: "pod".into(),
            name: "Pod".into(),
            pricing: Pricing::Simple {
                price: dec!(500),
                discount_price: None,
                discount_percent: None,
                stock: 5,
            },
        })
        .unwrap();
    let ledger = OrderLedger::new(storage.clone(), dec!(100), Arc::new(Notify::new()));
    let order = ledger
        .checkout(&CheckoutRequest {
            customer: CustomerSnapshot {
                name: "Asha".into(),
                phone: "9876543210".into(),
                email: None,
                address_line1: "12 MG Road".into(),
                address_line2: None,
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
            },
            items: vec![CheckoutItem {
                product_id: "pod".into(),
                variant_label: None,
                quantity: 2,
            }],
            payment_mode: PaymentMode::Cod,
            payment_reference: None,
        })
        .unwrap();
    (storage, order.id)
}

#[tokio::test]
async fn test_client_parses_booking_warehouses_and_tracking() {
    let base = spawn_stub().await;
    let carrier = client(&base, "ok", Duration::from_secs(5));
    let (storage, order_id) = placed_order();
    let order = storage.get_order(&order_id).unwrap().unwrap();

    let booked = carrier
        .create_shipment(&CarrierShipmentRequest::from_order(&order, "1", &package()))
        .await
        .unwrap();
    assert_eq!(booked.shipment_id, "98765");
    assert_eq!(booked.tracking_number, format!("AWB-{order_id}"));
    assert_eq!(booked.courier_name.as_deref(), Some("BlueDart"));

    let warehouses = carrier.list_warehouses().await.unwrap();
    assert_eq!(warehouses.len(), 2);
    assert_eq!(warehouses[0].id, "1");
    assert_eq!(warehouses[1].name, "Backup");

    let tracking = carrier.track("AWB1").await.unwrap();
    assert_eq!(tracking.raw_status, "Out For Delivery");
    assert_eq!(tracking.expected_delivery_date.as_deref(), Some("2026-10-25"));
}

#[tokio::test]
async fn test_wrong_api_key_is_http_status_error() {
    let base = spawn_stub().await;
    let carrier = HttpCarrierClient::new(&format!("{base}/ok"), "wrong", Duration::from_secs(5)).unwrap();
    let (storage, order_id) = placed_order();
    let order = storage.get_order(&order_id).unwrap().unwrap();

    let err = carrier
        .create_shipment(&CarrierShipmentRequest::from_order(&order, "1", &package()))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_failure_flag_on_success_status() {
    let base = spawn_stub().await;
    let carrier = client(&base, "flag", Duration::from_secs(5));
    let (storage, order_id) = placed_order();
    let order = storage.get_order(&order_id).unwrap().unwrap();

    let err = carrier
        .create_shipment(&CarrierShipmentRequest::from_order(&order, "1", &package()))
        .await
        .unwrap_err();
    match err {
        GatewayError::CarrierFailure { message, .. } => assert_eq!(message, "Pincode not serviceable"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_reported_as_timeout() {
    let base = spawn_stub().await;
    let carrier = client(&base, "slow", Duration::from_millis(200));
    let (storage, order_id) = placed_order();
    let order = storage.get_order(&order_id).unwrap().unwrap();

    let err = carrier
        .create_shipment(&CarrierShipmentRequest::from_order(&order, "1", &package()))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Timeout));
}

#[tokio::test]
async fn test_html_response_fails_shipment_but_not_fulfillment() {
    let base = spawn_stub().await;
    let (storage, order_id) = placed_order();
    let service = ShipmentService::new(
        storage.clone(),
        Some(Arc::new(client(&base, "html", Duration::from_secs(5)))),
    );
    let req = CreateShipmentRequest {
        warehouse_id: "1".into(),
        package: package(),
    };

    let err = service.create_shipment(&order_id, &req).await.unwrap_err();
    match &err {
        ShipmentError::Gateway(GatewayError::NonJson { status, excerpt }) => {
            assert_eq!(*status, 502);
            assert!(excerpt.starts_with("<html>"));
            assert_eq!(excerpt.chars().count(), 256);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let order = storage.get_order(&order_id).unwrap().unwrap();
    assert_eq!(order.shipment_status, ShipmentStatus::Failed);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Pending);
    assert!(order.tracking_number.is_none());

    let attempts = service.list_attempts(&order_id).unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].outcome, AttemptOutcome::Failed);
    assert!(attempts[0].raw_excerpt.is_some());
}

#[tokio::test]
async fn test_booking_then_tracking_end_to_end() {
    let base = spawn_stub().await;
    let (storage, order_id) = placed_order();
    let service = ShipmentService::new(
        storage.clone(),
        Some(Arc::new(client(&base, "ok", Duration::from_secs(5)))),
    );
    let req = CreateShipmentRequest {
        warehouse_id: "1".into(),
        package: package(),
    };

    let order = service.create_shipment(&order_id, &req).await.unwrap();
    assert_eq!(order.shipment_status, ShipmentStatus::Created);

    // "Out For Delivery" maps to in transit: PENDING → PACKED → IN_TRANSIT
    let update = service.refresh_tracking(&order_id).await.unwrap();
    assert_eq!(update.fulfillment_status, FulfillmentStatus::InTransit);
    assert_eq!(update.expected_delivery_date.as_deref(), Some("2026-10-25"));
}
