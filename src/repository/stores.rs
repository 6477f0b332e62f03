// ==========================================
// HRM8 销售引擎 - 存储接口 (Store Traits)
// ==========================================
// 职责: 定义引擎层依赖的数据访问接口 (不包含实现)
// 实现者: 各 *Repository (rusqlite), 测试中可替换为内存实现
// 红线: Store 不含业务规则; 条件更新由调用方给出期望状态
// ==========================================

use crate::domain::{
    AttributionState, AuditEntry, Commission, CommissionStatusUpdate, CommissionType, Company,
    CompanyPatch, Consultant, ConsultantJobAssignment, ConsultantPatch, Job, LicenseeStatus,
    PaymentStatus, Region, RegionalLicensee, RegionalRevenue, RevenueFilter, RevenueStatus,
    Settlement, Subscription,
};
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// ==========================================
// CompanyStore
// ==========================================
pub trait CompanyStore: Send + Sync {
    fn find_by_id(&self, company_id: &str) -> RepositoryResult<Option<Company>>;

    fn insert(&self, company: &Company) -> RepositoryResult<()>;

    /// 更新非归属字段
    ///
    /// # 返回
    /// - Ok(false): 公司不存在
    fn update_profile(
        &self,
        company_id: &str,
        patch: &CompanyPatch,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    /// 归属三元组比较并交换
    ///
    /// # 返回
    /// - Ok(true): 当前值等于 expected, 已写入 next
    /// - Ok(false): 当前值已被其他写入方修改 (或公司不存在)
    fn compare_and_set_attribution(
        &self,
        company_id: &str,
        expected: &AttributionState,
        next: &AttributionState,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    /// 所有 attribution_locked = true 的公司 (含已过期的锁)
    fn list_locked(&self) -> RepositoryResult<Vec<Company>>;
}

// ==========================================
// ConsultantStore
// ==========================================
pub trait ConsultantStore: Send + Sync {
    fn find_by_id(&self, consultant_id: &str) -> RepositoryResult<Option<Consultant>>;

    fn insert(&self, consultant: &Consultant) -> RepositoryResult<()>;

    /// 更新档案字段 (不含 current_jobs)
    fn update_profile(
        &self,
        consultant_id: &str,
        patch: &ConsultantPatch,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    /// 区域内全部顾问, 按 id 升序
    fn list_by_region(&self, region_id: &str) -> RepositoryResult<Vec<Consultant>>;

    /// 原子占用一个岗位名额
    ///
    /// 条件: status = ACTIVE 且 availability != AT_CAPACITY 且 current_jobs < max_jobs
    /// 占满后 availability 置为 AT_CAPACITY
    fn try_reserve_capacity(&self, consultant_id: &str, now: DateTime<Utc>)
        -> RepositoryResult<bool>;

    /// 释放一个岗位名额 (current_jobs 不低于 0)
    fn release_capacity(&self, consultant_id: &str, now: DateTime<Utc>) -> RepositoryResult<bool>;
}

// ==========================================
// AssignmentStore
// ==========================================
pub trait AssignmentStore: Send + Sync {
    fn find_active_for_job(&self, job_id: &str)
        -> RepositoryResult<Option<ConsultantJobAssignment>>;

    /// 按 (consultant_id, job_id) 插入或重新激活
    fn upsert_active(&self, assignment: &ConsultantJobAssignment) -> RepositoryResult<()>;

    /// ACTIVE -> INACTIVE; 已是 INACTIVE 时返回 false
    fn deactivate(&self, assignment_id: &str, now: DateTime<Utc>) -> RepositoryResult<bool>;

    fn list_for_consultant(
        &self,
        consultant_id: &str,
    ) -> RepositoryResult<Vec<ConsultantJobAssignment>>;

    /// 显式删除 (唯一的物理删除路径)
    fn delete(&self, assignment_id: &str) -> RepositoryResult<bool>;
}

// ==========================================
// JobStore
// ==========================================
pub trait JobStore: Send + Sync {
    fn find_by_id(&self, job_id: &str) -> RepositoryResult<Option<Job>>;

    fn insert(&self, job: &Job) -> RepositoryResult<()>;

    /// assigned_consultant_id 比较并交换
    fn compare_and_set_assignee(
        &self,
        job_id: &str,
        expected: Option<&str>,
        next: Option<&str>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    fn set_payment_status(
        &self,
        job_id: &str,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;
}

// ==========================================
// CommissionStore
// ==========================================
pub trait CommissionStore: Send + Sync {
    fn find_by_id(&self, commission_id: &str) -> RepositoryResult<Option<Commission>>;

    /// 幂等插入
    ///
    /// 同一 job_id + commission_type 已存在未取消的佣金时不插入, 返回已有记录
    ///
    /// # 返回
    /// - Ok(None): 已插入
    /// - Ok(Some(existing)): 已存在, 未插入
    fn insert_if_absent(&self, commission: &Commission) -> RepositoryResult<Option<Commission>>;

    /// 条件状态迁移 (WHERE status = expected)
    fn update_status_if(&self, update: &CommissionStatusUpdate) -> RepositoryResult<bool>;

    /// 仅 PENDING 佣金可调整金额
    fn update_amount_if_pending(
        &self,
        commission_id: &str,
        amount: Decimal,
        rate: Decimal,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    fn list_pending_by_type(
        &self,
        commission_type: CommissionType,
    ) -> RepositoryResult<Vec<Commission>>;

    /// PENDING 且 commission_expiry_date < now
    fn list_pending_with_expiry_before(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Commission>>;

    /// 区域内某类型佣金在 since 之后的创建数量
    fn count_created_since(
        &self,
        region_id: &str,
        commission_type: CommissionType,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64>;

    fn list_by_consultant(&self, consultant_id: &str) -> RepositoryResult<Vec<Commission>>;
}

// ==========================================
// SubscriptionStore
// ==========================================
pub trait SubscriptionStore: Send + Sync {
    fn find_by_id(&self, subscription_id: &str) -> RepositoryResult<Option<Subscription>>;

    fn insert(&self, subscription: &Subscription) -> RepositoryResult<()>;
}

// ==========================================
// RegionStore / LicenseeStore
// ==========================================
pub trait RegionStore: Send + Sync {
    fn find_by_id(&self, region_id: &str) -> RepositoryResult<Option<Region>>;

    fn insert(&self, region: &Region) -> RepositoryResult<()>;

    fn list_all(&self) -> RepositoryResult<Vec<Region>>;
}

pub trait LicenseeStore: Send + Sync {
    fn find_by_id(&self, licensee_id: &str) -> RepositoryResult<Option<RegionalLicensee>>;

    fn insert(&self, licensee: &RegionalLicensee) -> RepositoryResult<()>;

    fn list_all(&self) -> RepositoryResult<Vec<RegionalLicensee>>;

    /// 条件状态迁移 (WHERE status = expected)
    fn update_status_if(
        &self,
        licensee_id: &str,
        expected: LicenseeStatus,
        next: LicenseeStatus,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;
}

// ==========================================
// RevenueStore
// ==========================================
/// 分账记录写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevenueWriteOutcome {
    Written,
    /// 与同区域已有记录期间重叠
    Overlap { conflicting_id: String },
    /// 记录已离开 PENDING (仅更新时出现)
    NotPending,
    NotFound,
}

pub trait RevenueStore: Send + Sync {
    fn find_by_id(&self, revenue_id: &str) -> RepositoryResult<Option<RegionalRevenue>>;

    /// 单事务内做期间重叠检查并插入
    fn insert_checked(&self, revenue: &RegionalRevenue) -> RepositoryResult<RevenueWriteOutcome>;

    /// 单事务内做期间重叠检查 (排除自身) 并在 PENDING 时更新
    fn update_checked(&self, revenue: &RegionalRevenue) -> RepositoryResult<RevenueWriteOutcome>;

    /// 条件状态迁移 (WHERE status = expected)
    fn update_status_if(
        &self,
        revenue_id: &str,
        expected: RevenueStatus,
        next: RevenueStatus,
        paid_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    /// 按 period_start 升序
    fn query(&self, filter: &RevenueFilter) -> RepositoryResult<Vec<RegionalRevenue>>;
}

// ==========================================
// SettlementStore
// ==========================================
pub trait SettlementStore: Send + Sync {
    fn insert(&self, settlement: &Settlement) -> RepositoryResult<()>;

    fn list_pending(&self) -> RepositoryResult<Vec<Settlement>>;
}

// ==========================================
// AuditSink - 审计日志 (只追加)
// ==========================================
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: &AuditEntry) -> RepositoryResult<()>;

    fn list_for_entity(&self, entity_type: &str, entity_id: &str)
        -> RepositoryResult<Vec<AuditEntry>>;
}
