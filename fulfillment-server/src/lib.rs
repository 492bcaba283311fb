//! Fulfillment Server - 订单履约与库存一致性服务
//!
//! # 架构概述
//!
//! - **下单** (`orders`): 定价、支付凭证去重、单事务落单
//! - **库存** (`inventory`): 原子比较并扣减，取消时回补
//! - **物流** (`shipment`): 承运商对接、状态归一化、定时轮询
//! - **通知** (`notify`): outbox + 后台投递
//! - **数据库** (`db`): 嵌入式 redb 存储
//! - **HTTP API** (`api`): 下单与管理端接口
//!
//! # 模块结构
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── catalog/       # 商品快照读取
//! ├── db/            # redb 存储与迁移
//! ├── inventory/     # 库存账本
//! ├── notify/        # 管理员通知
//! ├── orders/        # 定价、支付凭证、下单、状态流转
//! ├── shipment/      # 承运商与物流状态
//! └── utils/         # 日志、处理器辅助
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod db;
pub mod inventory;
pub mod notify;
pub mod orders;
pub mod shipment;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use orders::{OrderLedger, OrderManager};
pub use shipment::ShipmentService;
pub use utils::{AppError, AppResult, ApiResponse, ErrorCategory, ErrorCode};
pub use utils::logger::{cleanup_old_logs, init_logger};

/// 初始化日志 (生产环境输出 JSON)
///
/// 日志目录不存在时会被创建；旧的滚动日志在这里清理一次。
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    init_logger(
        &config.log_level,
        config.is_production(),
        config.log_dir.as_deref(),
    )?;

    if let Some(dir) = &config.log_dir {
        match cleanup_old_logs(std::path::Path::new(dir), utils::logger::LOG_RETENTION_DAYS) {
            Ok(0) => {}
            Ok(n) => tracing::info!(removed = n, "Old log files cleaned up"),
            Err(e) => tracing::warn!(error = %e, "Failed to clean up old log files"),
        }
    }
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
  _____ _   _ _     _____ ___ _     _
 |  ___| | | | |   |  ___|_ _| |   | |
 | |_  | | | | |   | |_   | || |   | |
 |  _| | |_| | |___|  _|  | || |___| |___
 |_|    \___/|_____|_|   |___|_____|_____|
        order fulfillment server v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
