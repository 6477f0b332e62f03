// ==========================================
// HRM8 销售引擎 - 佣金领域模型
// ==========================================
// 红线: CONFIRMED / PAID 之后金额不可修改
// 红线: 只有 PENDING 佣金可以因过期转为 CANCELLED
// ==========================================

use crate::domain::types::{CommissionStatus, CommissionType, SubscriptionStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Commission - 佣金记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub id: String,
    pub consultant_id: String,
    pub job_id: Option<String>,
    pub region_id: Option<String>,
    pub subscription_id: Option<String>,

    pub commission_type: CommissionType,
    pub amount: Decimal,
    pub rate: Decimal, // 仅用于审计
    pub status: CommissionStatus,

    pub commission_expiry_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Subscription - 客户订阅 (只读)
// ==========================================
// 销售佣金过期判定的第二个时间锚点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub company_id: String,
    pub start_date: NaiveDate,
    pub status: SubscriptionStatus,
}

// ==========================================
// CommissionStatusUpdate - 条件状态更新
// ==========================================
// 仅当当前状态等于 expected 时才写入
#[derive(Debug, Clone)]
pub struct CommissionStatusUpdate {
    pub commission_id: String,
    pub expected: CommissionStatus,
    pub next: CommissionStatus,
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
