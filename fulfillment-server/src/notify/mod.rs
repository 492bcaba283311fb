//! 管理员通知 - outbox + 后台投递

pub mod notifier;
pub mod worker;

pub use notifier::{LogNotifier, Notification, Notifier, NotifyError, WebhookNotifier};
pub use worker::NotificationWorker;
