// ==========================================
// HRM8 销售引擎 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合各服务所需的 Store trait 对象
// 目标: 服务构造函数只接收一个仓储参数, 测试可整体替换为内存实现
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    AssignmentRepository, AssignmentStore, AuditLogRepository, AuditSink, CommissionRepository,
    CommissionStore, CompanyRepository, CompanyStore, ConsultantRepository, ConsultantStore,
    JobRepository, JobStore, LicenseeRepository, LicenseeStore, RegionRepository, RegionStore,
    RevenueRepository, RevenueStore, SettlementRepository, SettlementStore,
    SubscriptionRepository, SubscriptionStore,
};

/// 销售引擎仓储集合
#[derive(Clone)]
pub struct SalesRepositories {
    pub companies: Arc<dyn CompanyStore>,
    pub consultants: Arc<dyn ConsultantStore>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub jobs: Arc<dyn JobStore>,
    pub commissions: Arc<dyn CommissionStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub regions: Arc<dyn RegionStore>,
    pub licensees: Arc<dyn LicenseeStore>,
    pub revenues: Arc<dyn RevenueStore>,
    pub settlements: Arc<dyn SettlementStore>,
    pub audit: Arc<dyn AuditSink>,
}

impl SalesRepositories {
    /// 基于同一个 SQLite 连接构建全部仓储
    pub fn sqlite(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            companies: Arc::new(CompanyRepository::new(conn.clone())),
            consultants: Arc::new(ConsultantRepository::new(conn.clone())),
            assignments: Arc::new(AssignmentRepository::new(conn.clone())),
            jobs: Arc::new(JobRepository::new(conn.clone())),
            commissions: Arc::new(CommissionRepository::new(conn.clone())),
            subscriptions: Arc::new(SubscriptionRepository::new(conn.clone())),
            regions: Arc::new(RegionRepository::new(conn.clone())),
            licensees: Arc::new(LicenseeRepository::new(conn.clone())),
            revenues: Arc::new(RevenueRepository::new(conn.clone())),
            settlements: Arc::new(SettlementRepository::new(conn.clone())),
            audit: Arc::new(AuditLogRepository::new(conn)),
        }
    }
}

// 注: SalesRepositories 只是聚合结构体, 其正确性由各服务的测试验证
