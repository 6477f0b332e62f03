// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取 / 默认值 / 非法值 / 快照
// ==========================================

mod test_helpers;

use hrm8_sales_engine::config::{
    config_keys, ConfigError, ConfigManager, EngineConfigReader, MAX_DAYS,
};
use hrm8_sales_engine::db::{initialize_schema, open_sqlite_connection};
use rust_decimal::Decimal;
use test_helpers::create_test_db;

fn config_manager() -> (tempfile::NamedTempFile, ConfigManager) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_sqlite_connection(&db_path).expect("Failed to open db");
    initialize_schema(&conn).expect("Failed to init schema");
    let manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    (temp_file, manager)
}

#[tokio::test]
async fn test_defaults_when_keys_missing() {
    let (_tmp, config) = config_manager();

    assert_eq!(
        config.get_default_commission_rate().await.unwrap(),
        Decimal::new(10, 2)
    );
    assert_eq!(config.get_renewal_window_days().await.unwrap(), 30);
    assert_eq!(config.get_overdue_payout_days().await.unwrap(), 30);
    assert_eq!(config.get_inactive_region_days().await.unwrap(), 60);
    assert_eq!(config.get_revenue_decline_percent().await.unwrap(), 20.0);
    assert_eq!(config.get_agreement_expiry_warning_days().await.unwrap(), 30);
}

#[tokio::test]
async fn test_overrides_are_read_back() {
    let (_tmp, config) = config_manager();
    config
        .set_global_config_value(config_keys::DEFAULT_COMMISSION_RATE, "0.125")
        .unwrap();
    config
        .set_global_config_value(config_keys::REVENUE_DECLINE_PERCENT, "35.5")
        .unwrap();

    assert_eq!(
        config.get_default_commission_rate().await.unwrap(),
        Decimal::new(125, 3)
    );
    assert_eq!(config.get_revenue_decline_percent().await.unwrap(), 35.5);
}

#[tokio::test]
async fn test_malformed_and_out_of_range_values_are_errors() {
    let (_tmp, config) = config_manager();
    config
        .set_global_config_value(config_keys::OVERDUE_PAYOUT_DAYS, "-3")
        .unwrap();
    config
        .set_global_config_value(config_keys::DEFAULT_COMMISSION_RATE, "1.5")
        .unwrap();
    config
        .set_global_config_value(config_keys::RENEWAL_WINDOW_DAYS, "soon")
        .unwrap();

    assert!(matches!(
        config.get_overdue_payout_days().await,
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.get_default_commission_rate().await,
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.get_renewal_window_days().await,
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn test_day_counts_above_upper_bound_are_errors() {
    let (_tmp, config) = config_manager();
    config
        .set_global_config_value(config_keys::INACTIVE_REGION_DAYS, "9223372036854775807")
        .unwrap();
    config
        .set_global_config_value(config_keys::OVERDUE_PAYOUT_DAYS, &(MAX_DAYS + 1).to_string())
        .unwrap();
    config
        .set_global_config_value(config_keys::AGREEMENT_EXPIRY_WARNING_DAYS, &MAX_DAYS.to_string())
        .unwrap();

    assert!(matches!(
        config.get_inactive_region_days().await,
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.get_overdue_payout_days().await,
        Err(ConfigError::InvalidValue { .. })
    ));
    assert_eq!(
        config.get_agreement_expiry_warning_days().await.unwrap(),
        MAX_DAYS
    );
}

#[tokio::test]
async fn test_snapshot_restore_roundtrip() {
    let (_tmp, config) = config_manager();
    config
        .set_global_config_value(config_keys::INACTIVE_REGION_DAYS, "45")
        .unwrap();
    let snapshot = config.get_config_snapshot().unwrap();

    config
        .set_global_config_value(config_keys::INACTIVE_REGION_DAYS, "90")
        .unwrap();
    assert_eq!(config.get_inactive_region_days().await.unwrap(), 90);

    let restored = config.restore_config_from_snapshot(&snapshot).unwrap();
    assert!(restored >= 1);
    assert_eq!(config.get_inactive_region_days().await.unwrap(), 45);
}
