// ==========================================
// HRM8 销售引擎 - 区域分账领域模型
// ==========================================
// 红线: total_revenue = licensee_share + hrm8_share (精确相等)
// 红线: 同一区域的核算期间不得重叠
// ==========================================

use crate::domain::types::{LicenseeStatus, RevenueStatus, SettlementStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Region - 区域
// ==========================================
// licensee_id = None 表示 HRM8 自营区域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub licensee_id: Option<String>,
    pub is_active: bool,
}

impl Region {
    pub fn is_licensee_owned(&self) -> bool {
        self.licensee_id.is_some()
    }
}

// ==========================================
// RegionalLicensee - 区域被许可方
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalLicensee {
    pub id: String,
    pub name: String,
    pub revenue_share_percent: Decimal, // 0-100
    pub agreement_start_date: NaiveDate,
    pub agreement_end_date: Option<NaiveDate>,
    pub status: LicenseeStatus,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// RegionalRevenue - 区域期间收入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalRevenue {
    pub id: String,
    pub region_id: String,
    pub licensee_id: Option<String>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,

    // ===== 分账 =====
    pub total_revenue: Decimal,
    pub licensee_share: Decimal,
    pub hrm8_share: Decimal,

    pub status: RevenueStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegionalRevenue {
    pub fn is_balanced(&self) -> bool {
        self.licensee_share + self.hrm8_share == self.total_revenue
    }

    /// 与 [start, end] 是否有交集 (闭区间)
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.period_start <= end && start <= self.period_end
    }
}

// ==========================================
// RevenueSplitInput - 分账输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RevenueSplitInput {
    /// 显式给出两方份额, 必须与总额精确相等
    Explicit {
        licensee_share: Decimal,
        hrm8_share: Decimal,
    },
    /// 使用区域被许可方的 revenue_share_percent 计算
    FromLicensee,
}

// ==========================================
// RevenueDraft - 新建分账记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueDraft {
    pub region_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_revenue: Decimal,
    pub split: RevenueSplitInput,
}

// ==========================================
// RevenuePatch - 分账记录补丁 (仅 PENDING 可用)
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenuePatch {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_revenue: Option<Decimal>,
    pub split: Option<RevenueSplitInput>,
}

// ==========================================
// RevenueFilter - 查询条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueFilter {
    pub region_id: Option<String>,
    pub licensee_id: Option<String>,
    pub status: Option<RevenueStatus>,
    /// 与该闭区间有交集的记录
    pub overlaps: Option<(NaiveDate, NaiveDate)>,
}

impl RevenueFilter {
    pub fn for_region(region_id: impl Into<String>) -> Self {
        Self {
            region_id: Some(region_id.into()),
            ..Default::default()
        }
    }
}

// ==========================================
// RevenueSummary - 汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub record_count: usize,
    pub total_revenue: Decimal,
    pub licensee_share: Decimal,
    pub hrm8_share: Decimal,
}

// ==========================================
// Settlement - 被许可方结算单 (外部所有, 只读)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: String,
    pub licensee_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_amount: Decimal,
    pub status: SettlementStatus,
    pub generated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}
