// ==========================================
// HRM8 销售引擎 - 配置层
// ==========================================
// 职责: 引擎阈值与默认值的读取
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, MAX_DAYS};
pub use engine_config_trait::{ConfigError, ConfigResult, EngineConfigReader};
