// ==========================================
// HRM8 销售引擎 - 应用状态
// ==========================================
// 职责: 打开共享连接, 装配仓储与全部引擎服务
// 使用方: run_daily_sweeps 二进制 / 集成测试 / 上层服务宿主
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::ConfigManager;
use crate::db::{initialize_schema, open_sqlite_connection};
use crate::engine::{
    AttributionService, AutoAssignmentService, CommissionEngine, ComplianceAlertService,
    LicenseeService, NotificationPublisher, OptionalNotificationPublisher, PaymentEventHandler,
    RegionalRevenueLedger, SalesRepositories, ScheduledSweeps,
};

/// 应用状态
///
/// 所有服务共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub conn: Arc<Mutex<Connection>>,
    pub repos: SalesRepositories,
    pub config: Arc<ConfigManager>,

    pub attribution: Arc<AttributionService<ConfigManager>>,
    pub assignment: Arc<AutoAssignmentService>,
    pub commissions: Arc<CommissionEngine<ConfigManager>>,
    pub ledger: Arc<RegionalRevenueLedger>,
    pub licensees: Arc<LicenseeService>,
    pub compliance: Arc<ComplianceAlertService<ConfigManager>>,
    pub payment_events: Arc<PaymentEventHandler<ConfigManager>>,
    pub sweeps: Arc<ScheduledSweeps<ConfigManager>>,

    /// 通知发布器 (未配置时为空实现)
    pub notifier: OptionalNotificationPublisher,
}

impl AppState {
    /// 创建新的AppState实例 (不带通知发布器)
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表 (幂等)
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::build(db_path, OptionalNotificationPublisher::none())
    }

    /// 创建带通知发布器的AppState实例
    pub fn with_publisher(
        db_path: String,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Result<Self, String> {
        Self::build(
            db_path,
            OptionalNotificationPublisher::with_publisher(publisher),
        )
    }

    fn build(db_path: String, notifier: OptionalNotificationPublisher) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        initialize_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repos = SalesRepositories::sqlite(conn.clone());
        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let attribution = Arc::new(AttributionService::new(
            repos.clone(),
            config.clone(),
            notifier.clone(),
        ));
        let assignment = Arc::new(AutoAssignmentService::new(repos.clone(), notifier.clone()));
        let commissions = Arc::new(CommissionEngine::new(
            repos.clone(),
            config.clone(),
            notifier.clone(),
        ));
        let ledger = Arc::new(RegionalRevenueLedger::new(repos.clone(), notifier.clone()));
        let licensees = Arc::new(LicenseeService::new(repos.clone(), notifier.clone()));
        let compliance = Arc::new(ComplianceAlertService::new(
            repos.clone(),
            config.clone(),
            notifier.clone(),
        ));
        let payment_events = Arc::new(PaymentEventHandler::new(
            repos.clone(),
            attribution.clone(),
            commissions.clone(),
        ));
        let sweeps = Arc::new(ScheduledSweeps::new(
            commissions.clone(),
            compliance.clone(),
            attribution.clone(),
        ));

        tracing::info!(
            notifications = notifier.is_configured(),
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            conn,
            repos,
            config,
            attribution,
            assignment,
            commissions,
            ledger,
            licensees,
            compliance,
            payment_events,
            sweeps,
            notifier,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 HRM8_SALES_ENGINE_DB_PATH 优先
/// - 开发环境: 用户数据目录/hrm8-sales-engine-dev/hrm8_sales.db
/// - 生产环境: 用户数据目录/hrm8-sales-engine/hrm8_sales.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("HRM8_SALES_ENGINE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./hrm8_sales.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("hrm8-sales-engine-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("hrm8-sales-engine");
        }

        // 目录创建失败时由后续打开数据库报错
        std::fs::create_dir_all(&path).ok();
        path = path.join("hrm8_sales.db");
    }

    path.to_string_lossy().to_string()
}
