// ==========================================
// HRM8 销售引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config_trait::{ConfigError, ConfigResult, EngineConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 天数类配置的上限 (约 100 年)
pub const MAX_DAYS: i64 = 36_500;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) \
             VALUES ('global', ?1, ?2, datetime('now')) \
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "global config updated");
        Ok(())
    }

    /// 读取并解析配置; 缺失时返回默认值, 无法解析时报错
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> ConfigResult<T> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|_| {
                tracing::warn!(config_key = key, raw_value = %raw, "config value cannot be parsed");
                ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                }
            }),
        }
    }

    /// 非负整数天数配置
    fn get_days_or_default(&self, key: &str, default: i64) -> ConfigResult<i64> {
        let days = self.get_parsed_or_default(key, default)?;
        if !(0..=MAX_DAYS).contains(&days) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: days.to_string(),
            });
        }
        Ok(days)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 定时任务报告中记录本次运行使用的阈值
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖现有的 global 配置
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_default_commission_rate(&self) -> ConfigResult<Decimal> {
        let rate = self.get_parsed_or_default(
            config_keys::DEFAULT_COMMISSION_RATE,
            Decimal::new(10, 2),
        )?;
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                key: config_keys::DEFAULT_COMMISSION_RATE.to_string(),
                value: rate.to_string(),
            });
        }
        Ok(rate)
    }

    async fn get_renewal_window_days(&self) -> ConfigResult<i64> {
        self.get_days_or_default(config_keys::RENEWAL_WINDOW_DAYS, 30)
    }

    async fn get_overdue_payout_days(&self) -> ConfigResult<i64> {
        self.get_days_or_default(config_keys::OVERDUE_PAYOUT_DAYS, 30)
    }

    async fn get_inactive_region_days(&self) -> ConfigResult<i64> {
        self.get_days_or_default(config_keys::INACTIVE_REGION_DAYS, 60)
    }

    async fn get_revenue_decline_percent(&self) -> ConfigResult<f64> {
        let pct = self.get_parsed_or_default(config_keys::REVENUE_DECLINE_PERCENT, 20.0_f64)?;
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(ConfigError::InvalidValue {
                key: config_keys::REVENUE_DECLINE_PERCENT.to_string(),
                value: pct.to_string(),
            });
        }
        Ok(pct)
    }

    async fn get_agreement_expiry_warning_days(&self) -> ConfigResult<i64> {
        self.get_days_or_default(config_keys::AGREEMENT_EXPIRY_WARNING_DAYS, 30)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 佣金
    pub const DEFAULT_COMMISSION_RATE: &str = "default_commission_rate";

    // 归属
    pub const RENEWAL_WINDOW_DAYS: &str = "renewal_window_days";

    // 合规检测
    pub const OVERDUE_PAYOUT_DAYS: &str = "overdue_payout_days";
    pub const INACTIVE_REGION_DAYS: &str = "inactive_region_days";
    pub const REVENUE_DECLINE_PERCENT: &str = "revenue_decline_percent";
    pub const AGREEMENT_EXPIRY_WARNING_DAYS: &str = "agreement_expiry_warning_days";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::initialize_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let cfg = manager();
        assert_eq!(cfg.get_default_commission_rate().await.unwrap(), Decimal::new(10, 2));
        assert_eq!(cfg.get_overdue_payout_days().await.unwrap(), 30);
        assert_eq!(cfg.get_inactive_region_days().await.unwrap(), 60);
        assert_eq!(cfg.get_revenue_decline_percent().await.unwrap(), 20.0);
        assert_eq!(cfg.get_agreement_expiry_warning_days().await.unwrap(), 30);
        assert_eq!(cfg.get_renewal_window_days().await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_override_and_malformed_value() {
        let cfg = manager();
        cfg.set_global_config_value(config_keys::DEFAULT_COMMISSION_RATE, "0.125")
            .unwrap();
        assert_eq!(
            cfg.get_default_commission_rate().await.unwrap(),
            Decimal::new(125, 3)
        );

        cfg.set_global_config_value(config_keys::OVERDUE_PAYOUT_DAYS, "thirty")
            .unwrap();
        let err = cfg.get_overdue_payout_days().await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        cfg.set_global_config_value(config_keys::INACTIVE_REGION_DAYS, "-1")
            .unwrap();
        assert!(cfg.get_inactive_region_days().await.is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let cfg = manager();
        cfg.set_global_config_value(config_keys::RENEWAL_WINDOW_DAYS, "45")
            .unwrap();
        let snapshot = cfg.get_config_snapshot().unwrap();
        assert_eq!(snapshot, r#"{"renewal_window_days":"45"}"#);

        cfg.set_global_config_value(config_keys::RENEWAL_WINDOW_DAYS, "10")
            .unwrap();
        assert_eq!(cfg.restore_config_from_snapshot(&snapshot).unwrap(), 1);
        assert_eq!(
            cfg.get_global_config_value(config_keys::RENEWAL_WINDOW_DAYS)
                .unwrap()
                .as_deref(),
            Some("45")
        );
    }
}
