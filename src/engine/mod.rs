// ==========================================
// HRM8 销售引擎 - 引擎层
// ==========================================
// 职责: 归属/分配/佣金/分账/合规业务规则, 不拼 SQL
// 红线: Engine 不拼 SQL, 所有拒绝必须输出 reason
// 红线: 审计与通知为尽力而为, 失败不回滚主操作
// ==========================================

pub mod assignment;
pub mod attribution;
pub mod audit;
pub mod commission;
pub mod compliance;
pub mod error;
pub mod events;
pub mod ledger;
pub mod licensee;
pub mod payment_events;
pub mod repositories;
pub mod sales_core;
pub mod sweeps;

#[cfg(test)]
pub(crate) mod test_support;

// 重导出核心引擎
pub use assignment::{
    AssignmentMatch, AutoAssignmentService, EligibilityCheck, IneligibilityReason, NoMatchReason,
    RankedConsultant, ScoreBreakdown,
};
pub use attribution::{AttributionService, LockOutcome, RenewalOpportunity};
pub use audit::AuditRecorder;
pub use commission::{
    CommissionEngine, CommissionOutcome, ExpirySweepResult, PlacementCommissionRequest,
    SalesCommissionRequest, SweepError, SweepErrorCategory,
};
pub use compliance::{ComplianceAlertService, ComplianceThresholds};
pub use error::{
    AssignmentError, AttributionError, CommissionError, ComplianceError, LedgerError,
    LicenseeError, PaymentEventError,
};
pub use events::{
    NoOpNotificationPublisher, NotificationPublisher, OptionalNotificationPublisher, SalesEvent,
    SalesEventType,
};
pub use ledger::RegionalRevenueLedger;
pub use licensee::LicenseeService;
pub use payment_events::{JobPaidOutcome, PaymentEventHandler};
pub use repositories::SalesRepositories;
pub use sales_core::SalesCore;
pub use sweeps::{ScheduledSweeps, SweepReport};
