// ==========================================
// HRM8 销售引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化, 防止 SQL 注入
// 约束: 跨写入方的状态迁移一律使用条件更新 (WHERE 旧值 = 期望值)
// ==========================================

pub mod assignment_repo;
pub mod audit_log_repo;
pub mod commission_repo;
pub mod company_repo;
pub mod consultant_repo;
pub mod error;
pub mod job_repo;
pub mod region_repo;
pub mod revenue_repo;
pub mod row_utils;
pub mod settlement_repo;
pub mod stores;
pub mod subscription_repo;

// 重导出核心仓储
pub use assignment_repo::AssignmentRepository;
pub use audit_log_repo::AuditLogRepository;
pub use commission_repo::CommissionRepository;
pub use company_repo::CompanyRepository;
pub use consultant_repo::ConsultantRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use job_repo::JobRepository;
pub use region_repo::{LicenseeRepository, RegionRepository};
pub use revenue_repo::RevenueRepository;
pub use settlement_repo::SettlementRepository;
pub use stores::{
    AssignmentStore, AuditSink, CommissionStore, CompanyStore, ConsultantStore, JobStore,
    LicenseeStore, RegionStore, RevenueStore, RevenueWriteOutcome, SettlementStore,
    SubscriptionStore,
};
pub use subscription_repo::SubscriptionRepository;
