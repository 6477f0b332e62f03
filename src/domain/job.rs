// ==========================================
// HRM8 销售引擎 - 岗位与外部事件
// ==========================================
// 职责: 岗位子集字段 + 支付/录用事件载荷
// 说明: 岗位生命周期由外部服务负责, 这里只读取和回写分配字段
// ==========================================

use crate::domain::types::{PaymentStatus, ServicePackage};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Job - 岗位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub region_id: Option<String>,
    pub category: Option<String>,
    pub assigned_consultant_id: Option<String>,
    pub service_package: ServicePackage,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// JobPaidEvent - 支付完成事件
// ==========================================
// 来源: 支付回调 (checkout completed); 可能重复投递
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPaidEvent {
    pub job_id: String,
    pub company_id: String,
    pub service_package: ServicePackage,
    pub amount_paid: Decimal,
    pub subscription_id: Option<String>,
}

// ==========================================
// CandidateHiredEvent - 候选人录用事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateHiredEvent {
    pub job_id: String,
    pub consultant_id: String,
    pub placement_fee: Decimal,
    pub commission_expiry_date: Option<DateTime<Utc>>,
}
