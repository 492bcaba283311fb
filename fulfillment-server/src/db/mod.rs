//! 数据库层 - 嵌入式 redb 存储
//!
//! - [`storage`] - 表定义和读写操作
//! - [`migration`] - 启动时的版本化 schema 迁移

pub mod migration;
pub mod storage;

pub use storage::{
    DeadNotification, OutboxEntry, PaymentReferenceRecord, Storage, StorageError, StorageResult,
};
