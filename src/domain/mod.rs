// ==========================================
// HRM8 销售引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、补丁对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit;
pub mod commission;
pub mod company;
pub mod compliance;
pub mod consultant;
pub mod job;
pub mod revenue;
pub mod types;

// 重导出核心类型
pub use audit::{entity_types, AuditAction, AuditEntry, SYSTEM_ACTOR};
pub use commission::{Commission, CommissionStatusUpdate, Subscription};
pub use company::{AttributionState, Company, CompanyPatch};
pub use compliance::{ComplianceAlert, ComplianceSummary};
pub use consultant::{Consultant, ConsultantJobAssignment, ConsultantPatch};
pub use job::{CandidateHiredEvent, Job, JobPaidEvent};
pub use revenue::{
    Region, RegionalLicensee, RegionalRevenue, RevenueDraft, RevenueFilter, RevenuePatch,
    RevenueSplitInput, RevenueSummary, Settlement,
};
pub use types::{
    AlertSeverity, AlertType, AssignmentSource, AssignmentStatus, Availability, CommissionStatus,
    CommissionType, ConsultantRole, ConsultantStatus, LicenseeStatus, PaymentStatus,
    RevenueStatus, ServicePackage, SettlementStatus, SubscriptionStatus,
};
