// ==========================================
// HRM8 销售引擎 - 佣金引擎
// ==========================================
// 职责: 佣金创建 (幂等)、生命周期迁移、过期清扫
// 红线: 金额 = round2(价格 × 费率), 四舍五入远离零
// 红线: CONFIRMED / PAID 后金额不可变; 只有 PENDING 可被过期取消
// ==========================================
// 状态机: PENDING -> CONFIRMED -> PAID
//         PENDING -> CANCELLED
// ==========================================

mod core;
mod expiry;


pub use self::core::CommissionEngine;
pub use self::expiry::{ExpirySweepResult, SweepError, SweepErrorCategory};

use crate::domain::Commission;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 创建结果
#[derive(Debug, Clone, PartialEq)]
pub enum CommissionOutcome {
    Created(Commission),
    /// 同一岗位同一类型已存在未取消的佣金
    AlreadyExists(Commission),
}

impl CommissionOutcome {
    pub fn commission(&self) -> &Commission {
        match self {
            CommissionOutcome::Created(c) | CommissionOutcome::AlreadyExists(c) => c,
        }
    }

    pub fn into_commission(self) -> Commission {
        match self {
            CommissionOutcome::Created(c) | CommissionOutcome::AlreadyExists(c) => c,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CommissionOutcome::Created(_))
    }
}

/// 套餐销售佣金请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesCommissionRequest {
    pub consultant_id: String,
    pub job_id: Option<String>,
    pub region_id: Option<String>,
    pub subscription_id: Option<String>,
    pub price: Decimal,
    /// None 时依次取顾问默认费率、全局默认费率
    pub rate: Option<Decimal>,
}

/// 成功入职佣金请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementCommissionRequest {
    pub consultant_id: String,
    pub job_id: String,
    pub placement_fee: Decimal,
    pub rate: Option<Decimal>,
    pub commission_expiry_date: Option<DateTime<Utc>>,
}
