//! Carrier API client
//!
//! Three endpoints, all authenticated with an API key header:
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | POST | `{base}/create-shipment` | shipment id + AWB |
//! | GET | `{base}/list-warehouses` | pickup locations |
//! | GET | `{base}/track-order?awb=…` | current status |
//!
//! Carriers answer in loosely shaped JSON: the payload may sit under `data`,
//! identifiers may be numbers, and a 200 response may still carry a failure
//! flag. Every response is read as text first so that a non-JSON body (an
//! HTML error page from a proxy, say) still yields a diagnostic excerpt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use shared::order::{Order, PaymentMode};
use shared::shipment::{PackageDimensions, ShipmentRef, TrackingInfo, Warehouse};
use thiserror::Error;

/// Maximum characters of a raw carrier response kept for diagnostics
pub const RAW_EXCERPT_LIMIT: usize = 256;

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Carrier request timed out")]
    Timeout,

    #[error("Carrier unreachable: {0}")]
    Network(String),

    #[error("Carrier returned a non-JSON response (HTTP {status})")]
    NonJson { status: u16, excerpt: String },

    #[error("Carrier rejected the request: {message}")]
    CarrierFailure { message: String, excerpt: String },

    #[error("Carrier returned HTTP {status}: {message}")]
    HttpStatus {
        status: u16,
        message: String,
        excerpt: String,
    },

    #[error("Invalid carrier configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Truncated raw response, when one was received
    pub fn raw_excerpt(&self) -> Option<&str> {
        match self {
            GatewayError::NonJson { excerpt, .. }
            | GatewayError::CarrierFailure { excerpt, .. }
            | GatewayError::HttpStatus { excerpt, .. } => Some(excerpt),
            _ => None,
        }
    }
}

/// First [`RAW_EXCERPT_LIMIT`] characters of a response body
pub fn raw_excerpt(body: &str) -> String {
    body.trim().chars().take(RAW_EXCERPT_LIMIT).collect()
}

/// Outbound shipment booking payload
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CarrierShipmentRequest {
    pub order_id: String,
    pub order_date: String,
    pub pickup_location: String,
    pub billing_customer_name: String,
    pub billing_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_email: Option<String>,
    pub billing_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address_2: Option<String>,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_pincode: String,
    pub order_items: Vec<CarrierItem>,
    pub payment_method: &'static str,
    pub sub_total: Decimal,
    pub weight: Decimal,
    pub length: Decimal,
    pub breadth: Decimal,
    pub height: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CarrierItem {
    pub name: String,
    pub sku: String,
    pub units: u32,
    pub selling_price: Decimal,
}

impl CarrierShipmentRequest {
    pub fn from_order(order: &Order, warehouse_id: &str, package: &PackageDimensions) -> Self {
        let customer = &order.customer;
        let order_date = chrono::DateTime::from_timestamp_millis(order.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        Self {
            order_id: order.id.clone(),
            order_date,
            pickup_location: warehouse_id.to_string(),
            billing_customer_name: customer.name.clone(),
            billing_phone: customer.phone.clone(),
            billing_email: customer.email.clone(),
            billing_address: customer.address_line1.clone(),
            billing_address_2: customer.address_line2.clone(),
            billing_city: customer.city.clone(),
            billing_state: customer.state.clone(),
            billing_pincode: customer.pincode.clone(),
            order_items: order
                .lines
                .iter()
                .map(|line| CarrierItem {
                    name: shared::models::display_name(&line.product_name, line.variant_label.as_deref()),
                    sku: match &line.variant_label {
                        Some(label) => format!("{}-{}", line.product_id, label),
                        None => line.product_id.clone(),
                    },
                    units: line.quantity,
                    selling_price: line.unit_price,
                })
                .collect(),
            payment_method: match order.payment_mode {
                PaymentMode::Cod => "COD",
                PaymentMode::Prepaid => "Prepaid",
            },
            sub_total: order.subtotal,
            weight: package.weight_kg,
            length: package.length_cm,
            breadth: package.breadth_cm,
            height: package.height_cm,
        }
    }
}

/// Carrier operations used by the shipment service
#[async_trait]
pub trait CarrierApi: Send + Sync {
    async fn create_shipment(&self, req: &CarrierShipmentRequest) -> Result<ShipmentRef, GatewayError>;

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, GatewayError>;

    async fn track(&self, awb: &str) -> Result<TrackingInfo, GatewayError>;
}

/// reqwest-backed [`CarrierApi`]
pub struct HttpCarrierClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpCarrierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCarrierClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpCarrierClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, GatewayError> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        parse_body(status, &body)
    }
}

#[async_trait]
impl CarrierApi for HttpCarrierClient {
    async fn create_shipment(&self, req: &CarrierShipmentRequest) -> Result<ShipmentRef, GatewayError> {
        let url = format!("{}/create-shipment", self.base_url);
        let payload = self.send(self.client.post(&url).json(req)).await?;
        shipment_ref_from(&payload)
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, GatewayError> {
        let url = format!("{}/list-warehouses", self.base_url);
        let payload = self.send(self.client.get(&url)).await?;
        Ok(warehouses_from(&payload))
    }

    async fn track(&self, awb: &str) -> Result<TrackingInfo, GatewayError> {
        let url = format!("{}/track-order", self.base_url);
        let payload = self.send(self.client.get(&url).query(&[("awb", awb)])).await?;
        tracking_from(&payload)
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(e.to_string())
    }
}

/// Validate a carrier response and return its payload
///
/// Order of checks: JSON at all, explicit failure flag, HTTP status. The
/// payload is the `data` member when present, otherwise the whole document.
pub fn parse_body(status: u16, body: &str) -> Result<Value, GatewayError> {
    let json: Value = serde_json::from_str(body).map_err(|_| GatewayError::NonJson {
        status,
        excerpt: raw_excerpt(body),
    })?;

    if has_failure_flag(&json) {
        return Err(GatewayError::CarrierFailure {
            message: failure_message(&json).unwrap_or_else(|| "unspecified carrier error".into()),
            excerpt: raw_excerpt(body),
        });
    }

    if !(200..300).contains(&status) {
        return Err(GatewayError::HttpStatus {
            status,
            message: failure_message(&json).unwrap_or_default(),
            excerpt: raw_excerpt(body),
        });
    }

    Ok(match json.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => json,
    })
}

fn has_failure_flag(json: &Value) -> bool {
    if json.get("success").and_then(Value::as_bool) == Some(false) {
        return true;
    }
    matches!(
        json.get("status").and_then(Value::as_str).map(str::to_ascii_lowercase).as_deref(),
        Some("error" | "failed" | "failure")
    )
}

fn failure_message(json: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| json.get(*key).and_then(value_to_string))
}

/// String form of a scalar JSON value (carriers send ids as numbers or strings)
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| payload.get(*key).and_then(value_to_string))
}

fn shipment_ref_from(payload: &Value) -> Result<ShipmentRef, GatewayError> {
    let missing = |what: &str| GatewayError::CarrierFailure {
        message: format!("response has no {what}"),
        excerpt: raw_excerpt(&payload.to_string()),
    };
    Ok(ShipmentRef {
        shipment_id: field(payload, &["shipment_id", "shipmentId", "id"])
            .ok_or_else(|| missing("shipment id"))?,
        tracking_number: field(payload, &["awb_code", "awb", "tracking_number"])
            .ok_or_else(|| missing("AWB"))?,
        courier_name: field(payload, &["courier_name", "courier"]),
    })
}

fn warehouses_from(payload: &Value) -> Vec<Warehouse> {
    let list = payload
        .as_array()
        .or_else(|| payload.get("warehouses").and_then(Value::as_array))
        .or_else(|| payload.get("shipping_address").and_then(Value::as_array));
    list.into_iter()
        .flatten()
        .filter_map(|entry| {
            let id = field(entry, &["id", "warehouse_id", "pickup_location"])?;
            Some(Warehouse {
                name: field(entry, &["name", "warehouse_name", "pickup_location"])
                    .unwrap_or_else(|| id.clone()),
                id,
                address: field(entry, &["address", "address_line1"]),
                city: field(entry, &["city"]),
                pincode: field(entry, &["pincode", "pin_code"]),
            })
        })
        .collect()
}

fn tracking_from(payload: &Value) -> Result<TrackingInfo, GatewayError> {
    let payload = payload.get("tracking_data").unwrap_or(payload);
    let raw_status = field(payload, &["current_status", "shipment_status", "status"]).ok_or_else(|| {
        GatewayError::CarrierFailure {
            message: "response has no shipment status".into(),
            excerpt: raw_excerpt(&payload.to_string()),
        }
    })?;
    Ok(TrackingInfo {
        raw_status,
        expected_delivery_date: field(payload, &["expected_delivery_date", "etd", "edd"]),
        courier_name: field(payload, &["courier_name", "courier"]),
    })
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Scripted carrier for unit tests
    #[derive(Default)]
    pub struct MockCarrier {
        pub create_results: Mutex<Vec<Result<ShipmentRef, GatewayError>>>,
        pub track_results: Mutex<Vec<Result<TrackingInfo, GatewayError>>>,
        pub requests: Mutex<Vec<CarrierShipmentRequest>>,
    }

    impl MockCarrier {
        pub fn booking(result: Result<ShipmentRef, GatewayError>) -> Self {
            let mock = Self::default();
            mock.create_results.lock().unwrap().push(result);
            mock
        }

        pub fn push_tracking(&self, raw_status: &str) {
            self.track_results.lock().unwrap().push(Ok(TrackingInfo {
                raw_status: raw_status.into(),
                expected_delivery_date: Some("2026-10-25".into()),
                courier_name: Some("BlueDart".into()),
            }));
        }
    }

    #[async_trait]
    impl CarrierApi for MockCarrier {
        async fn create_shipment(&self, req: &CarrierShipmentRequest) -> Result<ShipmentRef, GatewayError> {
            self.requests.lock().unwrap().push(req.clone());
            self.create_results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(GatewayError::Network("no scripted response".into())))
        }

        async fn list_warehouses(&self) -> Result<Vec<Warehouse>, GatewayError> {
            Ok(vec![Warehouse {
                id: "WH-1".into(),
                name: "Main".into(),
                address: None,
                city: Some("Pune".into()),
                pincode: None,
            }])
        }

        async fn track(&self, _awb: &str) -> Result<TrackingInfo, GatewayError> {
            let mut results = self.track_results.lock().unwrap();
            if results.is_empty() {
                return Err(GatewayError::Timeout);
            }
            results.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_body_is_non_json() {
        let body = format!("<html><body>{}</body></html>", "x".repeat(1000));
        match parse_body(502, &body).unwrap_err() {
            GatewayError::NonJson { status, excerpt } => {
                assert_eq!(status, 502);
                assert_eq!(excerpt.chars().count(), RAW_EXCERPT_LIMIT);
                assert!(excerpt.starts_with("<html>"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failure_flag_beats_2xx() {
        let err = parse_body(200, r#"{"success": false, "message": "Pincode not serviceable"}"#).unwrap_err();
        match &err {
            GatewayError::CarrierFailure { message, excerpt } => {
                assert_eq!(message, "Pincode not serviceable");
                assert!(excerpt.contains("serviceable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.raw_excerpt().is_some());

        assert!(matches!(
            parse_body(200, r#"{"status": "ERROR"}"#),
            Err(GatewayError::CarrierFailure { .. })
        ));
    }

    #[test]
    fn test_non_2xx_json() {
        assert!(matches!(
            parse_body(401, r#"{"message": "bad key"}"#),
            Err(GatewayError::HttpStatus { status: 401, .. })
        ));
    }

    #[test]
    fn test_shipment_ref_accepts_numeric_ids() {
        let payload = parse_body(
            200,
            &json!({"data": {"shipment_id": 778812, "awb_code": "AWB123", "courier_name": "Delhivery"}}).to_string(),
        )
        .unwrap();
        let r = shipment_ref_from(&payload).unwrap();
        assert_eq!(r.shipment_id, "778812");
        assert_eq!(r.tracking_number, "AWB123");
        assert_eq!(r.courier_name.as_deref(), Some("Delhivery"));

        assert!(shipment_ref_from(&json!({"shipment_id": 1})).is_err());
    }

    #[test]
    fn test_warehouses_and_tracking_shapes() {
        let ws = warehouses_from(&json!({"warehouses": [
            {"id": 7, "name": "Pune WH", "city": "Pune"},
            {"name": "no id"}
        ]}));
        assert_eq!(ws.len(), 1);
        assert_eq!(ws[0].id, "7");

        let t = tracking_from(&json!({"tracking_data": {"current_status": "In Transit", "etd": "2026-10-20"}})).unwrap();
        assert_eq!(t.raw_status, "In Transit");
        assert_eq!(t.expected_delivery_date.as_deref(), Some("2026-10-20"));
    }
}
