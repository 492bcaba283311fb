use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;

/// 服务器配置 - 履约服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/fulfillment | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DELIVERY_FEE | 100 | 每单固定运费 |
/// | CARRIER_BASE_URL | (未设置) | 承运商 API 地址，未设置时禁用物流功能 |
/// | CARRIER_API_KEY | (空) | 承运商 API 密钥 |
/// | CARRIER_TIMEOUT_MS | 10000 | 承运商请求超时(毫秒) |
/// | TRACKING_POLL_INTERVAL_SECS | 900 | 物流轮询间隔，0 为关闭 |
/// | NOTIFY_WEBHOOK_URL | (未设置) | 管理员通知 webhook，未设置时写日志 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | (未设置) | 日志文件目录，未设置时只输出到终端 |
/// | CATALOG_SEED_FILE | (未设置) | 启动时导入的商品 JSON |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/shop HTTP_PORT=8080 CARRIER_BASE_URL=https://carrier.example.com/v1 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 每单固定运费
    pub delivery_fee: Decimal,

    // === 承运商 ===
    pub carrier_base_url: Option<String>,
    pub carrier_api_key: String,
    pub carrier_timeout_ms: u64,
    /// 物流轮询间隔 (秒)，0 表示关闭
    pub tracking_poll_interval_secs: u64,

    pub notify_webhook_url: Option<String>,

    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,

    pub log_level: String,
    pub log_dir: Option<String>,
    pub catalog_seed_file: Option<String>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/fulfillment".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            delivery_fee: env_parse("DELIVERY_FEE", Decimal::ONE_HUNDRED),
            carrier_base_url: env_opt("CARRIER_BASE_URL"),
            carrier_api_key: std::env::var("CARRIER_API_KEY").unwrap_or_default(),
            carrier_timeout_ms: env_parse("CARRIER_TIMEOUT_MS", 10_000),
            tracking_poll_interval_secs: env_parse("TRACKING_POLL_INTERVAL_SECS", 900),
            notify_webhook_url: env_opt("NOTIFY_WEBHOOK_URL"),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30_000),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10_000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            catalog_seed_file: env_opt("CATALOG_SEED_FILE"),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("fulfillment.redb")
    }

    pub fn carrier_timeout(&self) -> Duration {
        Duration::from_millis(self.carrier_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `None` when polling is disabled
    pub fn tracking_poll_interval(&self) -> Option<Duration> {
        (self.tracking_poll_interval_secs > 0)
            .then(|| Duration::from_secs(self.tracking_poll_interval_secs))
    }

    /// 创建工作目录结构
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
