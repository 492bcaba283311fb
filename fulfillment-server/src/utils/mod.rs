//! 工具模块
//!
//! - [`logger`] - 日志初始化与清理
//! - [`result`] - 处理器里调用同步存储的辅助函数

pub mod logger;
pub mod result;

pub use logger::{cleanup_old_logs, init_logger};
pub use result::blocking;
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
