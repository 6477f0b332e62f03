// ==========================================
// HRM8 销售引擎 - 核心库
// ==========================================
// 范围: 销售归属锁定 / 顾问自动分配 / 佣金生命周期 / 区域分账 / 合规告警
// 技术栈: Rust + SQLite
// 系统定位: 无界面核心库, 由宿主服务与定时任务调用
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 应用层 - 服务装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    Commission, Company, ComplianceAlert, Consultant, Job, Region, RegionalLicensee,
    RegionalRevenue,
};

// 引擎
pub use engine::{
    AttributionService, AutoAssignmentService, CommissionEngine, ComplianceAlertService,
    LicenseeService, PaymentEventHandler, RegionalRevenueLedger, ScheduledSweeps,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "HRM8 销售引擎";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
