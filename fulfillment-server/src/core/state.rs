use std::sync::Arc;

use tokio::sync::Notify;

use crate::catalog::CatalogReader;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerError};
use crate::db::Storage;
use crate::notify::{LogNotifier, NotificationWorker, Notifier, WebhookNotifier};
use crate::orders::{OrderLedger, OrderManager};
use crate::shipment::{CarrierApi, HttpCarrierClient, ShipmentService, TrackingPoller};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是廉价克隆 (内部为 Arc)，每个 HTTP 处理器拿到一份。
///
/// | 字段 | 说明 |
/// |------|------|
/// | storage | redb 存储 |
/// | catalog | 商品快照读取 |
/// | ledger | 下单 (唯一创建订单的入口) |
/// | orders | 订单查询与状态流转 |
/// | shipments | 承运商对接 |
/// | outbox_signal | 唤醒通知 worker |
/// | notifier | 管理员通知通道 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub storage: Storage,
    pub catalog: CatalogReader,
    pub ledger: OrderLedger,
    pub orders: OrderManager,
    pub shipments: ShipmentService,
    pub outbox_signal: Arc<Notify>,
    pub notifier: Arc<dyn Notifier>,
}

impl ServerState {
    /// 用已打开的存储和外部依赖组装状态
    ///
    /// 测试直接调用这里，传入内存数据库和 mock 承运商。
    pub fn new(
        config: Config,
        storage: Storage,
        carrier: Option<Arc<dyn CarrierApi>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let outbox_signal = Arc::new(Notify::new());
        Self {
            catalog: CatalogReader::new(storage.clone()),
            ledger: OrderLedger::new(storage.clone(), config.delivery_fee, outbox_signal.clone()),
            orders: OrderManager::new(storage.clone()),
            shipments: ShipmentService::new(storage.clone(), carrier)
                .with_call_timeout(config.carrier_timeout()),
            outbox_signal,
            notifier,
            storage,
            config,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录
    /// 2. 打开数据库 (含 schema 迁移)
    /// 3. 导入商品种子文件 (只插入缺失的商品)
    /// 4. 构建承运商客户端和通知通道
    pub fn initialize(config: &Config) -> Result<Self> {
        if config.delivery_fee.is_sign_negative() {
            return Err(ServerError::Config(format!(
                "DELIVERY_FEE must not be negative, got {}",
                config.delivery_fee
            )));
        }
        if config.carrier_timeout_ms >= config.request_timeout_ms {
            return Err(ServerError::Config(format!(
                "CARRIER_TIMEOUT_MS ({}) must be below REQUEST_TIMEOUT_MS ({})",
                config.carrier_timeout_ms, config.request_timeout_ms
            )));
        }
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let storage = Storage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        if let Some(seed) = &config.catalog_seed_file {
            CatalogReader::new(storage.clone()).seed_from_file(seed)?;
        }

        let carrier: Option<Arc<dyn CarrierApi>> = match &config.carrier_base_url {
            Some(url) => {
                if config.carrier_api_key.is_empty() {
                    tracing::warn!("CARRIER_API_KEY is empty, carrier requests will likely be rejected");
                }
                let client =
                    HttpCarrierClient::new(url, &config.carrier_api_key, config.carrier_timeout())?;
                tracing::info!(base_url = %url, "Carrier client configured");
                Some(Arc::new(client))
            }
            None => {
                tracing::warn!("CARRIER_BASE_URL not set, shipment booking and tracking are disabled");
                None
            }
        };

        let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url, config.carrier_timeout())?),
            None => Arc::new(LogNotifier),
        };

        Ok(Self::new(config.clone(), storage, carrier, notifier))
    }

    /// 启动后台任务
    ///
    /// - notification_worker: 投递 outbox 中的新订单通知
    /// - tracking_poller: 定时刷新在途订单的物流状态 (需要承运商且轮询间隔 > 0)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let worker = NotificationWorker::new(
            self.storage.clone(),
            self.notifier.clone(),
            self.outbox_signal.clone(),
            tasks.shutdown_token(),
        );
        tasks.spawn("notification_worker", TaskKind::Worker, worker.run());

        match self.config.tracking_poll_interval() {
            Some(interval) if self.shipments.carrier_configured() => {
                let poller =
                    TrackingPoller::new(self.shipments.clone(), interval, tasks.shutdown_token());
                tasks.spawn("tracking_poller", TaskKind::Periodic, poller.run());
            }
            Some(_) => tracing::debug!("Tracking poller skipped: no carrier configured"),
            None => tracing::info!("Tracking poller disabled"),
        }

        tasks.log_summary();
        tasks
    }
}
