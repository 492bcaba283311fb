//! 服务器启动与运行错误
//!
//! 请求级别的错误统一走 [`shared::AppError`]；这里只覆盖启动、绑定端口、
//! 后台依赖初始化这类让进程无法继续运行的失败。

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::db::StorageError;
use crate::notify::NotifyError;
use crate::shipment::GatewayError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库初始化失败: {0}")]
    Storage(#[from] StorageError),

    #[error("商品目录导入失败: {0}")]
    Catalog(#[from] CatalogError),

    #[error("承运商客户端初始化失败: {0}")]
    Carrier(#[from] GatewayError),

    #[error("通知通道初始化失败: {0}")]
    Notify(#[from] NotifyError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
