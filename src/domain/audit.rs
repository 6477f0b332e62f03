// ==========================================
// HRM8 销售引擎 - 审计日志领域模型
// ==========================================
// 红线: 审计日志只追加, 不修改不删除
// 用途: 归属锁定/转移、被许可方暂停/终止、佣金状态迁移
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ==========================================
// AuditEntry - 审计条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub old_value: Option<JsonValue>,
    pub new_value: Option<JsonValue>,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
}

impl AuditEntry {
    /// 新建审计条目 (id 为 UUID v4)
    pub fn new(
        entity_type: &str,
        entity_id: &str,
        action: AuditAction,
        performed_by: &str,
        performed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            action: action.as_str().to_string(),
            old_value: None,
            new_value: None,
            performed_by: performed_by.to_string(),
            performed_at,
        }
    }

    pub fn with_change(mut self, old_value: JsonValue, new_value: JsonValue) -> Self {
        self.old_value = Some(old_value);
        self.new_value = Some(new_value);
        self
    }
}

// ==========================================
// AuditAction - 审计动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AssignAgent,
    LockAttribution,
    UnlockAttribution,
    TransferAttribution,
    CommissionCreated,
    CommissionConfirmed,
    CommissionPaid,
    CommissionCancelled,
    CommissionExpired,
    CommissionAdjusted,
    RevenueConfirmed,
    RevenuePaid,
    LicenseeSuspended,
    LicenseeTerminated,
    LicenseeReactivated,
    ConsultantAssigned,
    ConsultantUnassigned,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AssignAgent => "ASSIGN_AGENT",
            AuditAction::LockAttribution => "LOCK_ATTRIBUTION",
            AuditAction::UnlockAttribution => "UNLOCK_ATTRIBUTION",
            AuditAction::TransferAttribution => "TRANSFER_ATTRIBUTION",
            AuditAction::CommissionCreated => "COMMISSION_CREATED",
            AuditAction::CommissionConfirmed => "COMMISSION_CONFIRMED",
            AuditAction::CommissionPaid => "COMMISSION_PAID",
            AuditAction::CommissionCancelled => "COMMISSION_CANCELLED",
            AuditAction::CommissionExpired => "COMMISSION_EXPIRED",
            AuditAction::CommissionAdjusted => "COMMISSION_ADJUSTED",
            AuditAction::RevenueConfirmed => "REVENUE_CONFIRMED",
            AuditAction::RevenuePaid => "REVENUE_PAID",
            AuditAction::LicenseeSuspended => "LICENSEE_SUSPENDED",
            AuditAction::LicenseeTerminated => "LICENSEE_TERMINATED",
            AuditAction::LicenseeReactivated => "LICENSEE_REACTIVATED",
            AuditAction::ConsultantAssigned => "CONSULTANT_ASSIGNED",
            AuditAction::ConsultantUnassigned => "CONSULTANT_UNASSIGNED",
        }
    }
}

/// 系统任务的操作人标识
pub const SYSTEM_ACTOR: &str = "system";

/// 审计实体类型
pub mod entity_types {
    pub const COMPANY: &str = "COMPANY";
    pub const COMMISSION: &str = "COMMISSION";
    pub const REGIONAL_REVENUE: &str = "REGIONAL_REVENUE";
    pub const REGIONAL_LICENSEE: &str = "REGIONAL_LICENSEE";
    pub const JOB: &str = "JOB";
}
