//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 数据库探活 + schema 版本 + 承运商配置 + 通知队列 |
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0",
//!   "database": "ok",
//!   "schema_version": 2,
//!   "carrier_configured": true,
//!   "pending_notifications": 0,
//!   "dead_notifications": 0
//! }
//! ```
//!
//! 有死信通知时 status 为 `degraded`，需要人工检查通知通道。

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::migration::SCHEMA_VERSION_KEY;
use crate::utils::blocking;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_version: Option<u64>,
    carrier_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_notifications: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dead_notifications: Option<usize>,
}

struct StorageProbe {
    schema_version: Option<u64>,
    pending: usize,
    dead: usize,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let storage = state.storage.clone();
    let probe = blocking(move || {
        storage.ping()?;
        Ok::<_, crate::db::StorageError>(StorageProbe {
            schema_version: storage.get_meta(SCHEMA_VERSION_KEY)?,
            pending: storage.get_pending_notifications()?.len(),
            dead: storage.list_dead_notifications()?.len(),
        })
    })
    .await;

    let carrier_configured = state.shipments.carrier_configured();
    let version = env!("CARGO_PKG_VERSION");
    match probe {
        Ok(probe) => {
            if probe.dead > 0 {
                tracing::warn!(dead = probe.dead, "Health check: dead-lettered notifications present");
            }
            Json(HealthResponse {
                status: if probe.dead == 0 { "ok" } else { "degraded" },
                version,
                database: "ok",
                schema_version: probe.schema_version,
                carrier_configured,
                pending_notifications: Some(probe.pending),
                dead_notifications: Some(probe.dead),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "Health check: database probe failed");
            Json(HealthResponse {
                status: "degraded",
                version,
                database: "error",
                schema_version: None,
                carrier_configured,
                pending_notifications: None,
                dead_notifications: None,
            })
        }
    }
}
