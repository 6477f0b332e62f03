// ==========================================
// HRM8 销售引擎 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义引擎层所需的配置读取接口 (不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// 配置读取错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config store lock poisoned: {0}")]
    LockError(String),

    #[error("invalid value for config key '{key}': '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("config store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("config snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager (从 config_kv 表读取)
// 约定: 配置缺失 -> 默认值; 配置存在但无法解析 -> ConfigError::InvalidValue
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== 佣金 =====

    /// 顾问未设置 default_commission_rate 时使用的佣金比例
    ///
    /// # 默认值
    /// - 0.10
    async fn get_default_commission_rate(&self) -> ConfigResult<Decimal>;

    // ===== 归属 =====

    /// 续约机会窗口 (锁定到期前多少天提醒)
    ///
    /// # 默认值
    /// - 30
    async fn get_renewal_window_days(&self) -> ConfigResult<i64>;

    // ===== 合规检测阈值 =====

    /// 结算单 PENDING 超过多少天视为逾期
    ///
    /// # 默认值
    /// - 30
    async fn get_overdue_payout_days(&self) -> ConfigResult<i64>;

    /// 区域多少天内没有 PLACEMENT 佣金视为不活跃
    ///
    /// # 默认值
    /// - 60
    async fn get_inactive_region_days(&self) -> ConfigResult<i64>;

    /// 上月收入环比下降百分比阈值
    ///
    /// # 默认值
    /// - 20.0
    async fn get_revenue_decline_percent(&self) -> ConfigResult<f64>;

    /// 协议到期预警天数 (含当天)
    ///
    /// # 默认值
    /// - 30
    async fn get_agreement_expiry_warning_days(&self) -> ConfigResult<i64>;
}
