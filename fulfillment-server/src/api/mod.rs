//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`checkout`] - 下单
//! - [`catalog`] - 商品快照查询
//! - [`orders`] - 订单查询与管理端状态流转
//! - [`shipments`] - 管理端物流操作
//!
//! 管理端路由统一挂在 `/api/admin` 下，认证由前置网关负责。

pub mod catalog;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod shipments;

use axum::Router;
use http::{HeaderName, HeaderValue, StatusCode};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub use crate::utils::{AppError, AppResult};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// UUID v4 request IDs
#[derive(Clone, Default)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(checkout::router())
        .merge(catalog::router())
        .merge(orders::router())
        .merge(shipments::router())
}

/// Fully configured application: routes, middleware and state
///
/// Used by the HTTP server and by integration tests via `oneshot`.
///
/// The last layer added is the outermost. `SetRequestIdLayer` must wrap
/// `PropagateRequestIdLayer` so the id exists before it is copied onto the
/// response.
pub fn build_app(state: ServerState) -> Router {
    let request_timeout = state.config.request_timeout();
    build_router()
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
