// ==========================================
// HRM8 销售引擎 - 顾问自动分配
// ==========================================
// 职责: 准入门槛判定 + 加权评分排序 + 带容量校验的分配/撤销
// 红线: current_jobs 只允许在分配/撤销路径中变化
// 红线: 所有门槛拒绝都必须输出 reason
// ==========================================
// 评分 (基础分 100, 累加):
// - 工作量 0-40: 40 × (1 − current/max)
// - 行业专长 +30 (全有或全无)
// - 成功率 0-10: min(10, success_rate/10)
// - 速度 0-10: 10 × (1 − min(1, days/60))
// 排序: 总分降序, 同分按顾问 id 升序
// ==========================================

mod core;
mod scoring;


pub use self::core::AutoAssignmentService;
pub use self::scoring::ScoreBreakdown;

use crate::domain::{Availability, Consultant, ConsultantStatus, Job};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ==========================================
// 准入判定结果
// ==========================================

/// 不可分配原因 (按门槛顺序)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IneligibilityReason {
    JobNotFound,
    ConsultantNotFound,
    JobHasNoRegion,
    WrongRegion,
    WrongRole,
    NotActive,
    AtCapacity,
    MaxJobsReached,
}

impl IneligibilityReason {
    pub fn message(&self) -> &'static str {
        match self {
            IneligibilityReason::JobNotFound => "job not found",
            IneligibilityReason::ConsultantNotFound => "consultant not found",
            IneligibilityReason::JobHasNoRegion => "job has no region",
            IneligibilityReason::WrongRegion => "wrong region",
            IneligibilityReason::WrongRole => "wrong role",
            IneligibilityReason::NotActive => "consultant not active",
            IneligibilityReason::AtCapacity => "consultant at capacity",
            IneligibilityReason::MaxJobsReached => "max jobs reached",
        }
    }

    /// 门槛 5/6 属于容量问题, 分配时映射为 CapacityExhausted
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            IneligibilityReason::AtCapacity | IneligibilityReason::MaxJobsReached
        )
    }
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCheck {
    pub consultant_id: String,
    pub job_id: String,
    pub eligible: bool,
    pub reason: Option<IneligibilityReason>,
}

impl EligibilityCheck {
    pub fn eligible(consultant_id: &str, job_id: &str) -> Self {
        Self {
            consultant_id: consultant_id.to_string(),
            job_id: job_id.to_string(),
            eligible: true,
            reason: None,
        }
    }

    pub fn rejected(consultant_id: &str, job_id: &str, reason: IneligibilityReason) -> Self {
        Self {
            consultant_id: consultant_id.to_string(),
            job_id: job_id.to_string(),
            eligible: false,
            reason: Some(reason),
        }
    }
}

// ==========================================
// 匹配结果
// ==========================================

/// 无匹配原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoMatchReason {
    JobNotFound,
    JobHasNoRegion,
    NoConsultantsInRegion,
    AllAtCapacity,
    NoEligibleConsultants,
}

impl NoMatchReason {
    pub fn message(&self) -> &'static str {
        match self {
            NoMatchReason::JobNotFound => "job not found",
            NoMatchReason::JobHasNoRegion => "job has no region",
            NoMatchReason::NoConsultantsInRegion => "no consultants in region",
            NoMatchReason::AllAtCapacity => "all consultants at capacity",
            NoMatchReason::NoEligibleConsultants => "no eligible consultants",
        }
    }
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedConsultant {
    pub consultant_id: String,
    pub consultant_name: String,
    pub score: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentMatch {
    pub job_id: String,
    /// 排名第一的顾问; 无匹配时为 None
    pub best: Option<RankedConsultant>,
    /// 全部可分配顾问, 已排序
    pub ranked: Vec<RankedConsultant>,
    pub no_match: Option<NoMatchReason>,
    pub reason: String,
}

impl AssignmentMatch {
    pub(crate) fn no_match(job_id: &str, reason: NoMatchReason) -> Self {
        Self {
            job_id: job_id.to_string(),
            best: None,
            ranked: Vec::new(),
            no_match: Some(reason),
            reason: reason.message().to_string(),
        }
    }

    pub fn has_match(&self) -> bool {
        self.best.is_some()
    }
}

// ==========================================
// 纯函数: 准入门槛与排序
// ==========================================

/// 按顺序检查 6 道门槛, 返回第一个失败原因
pub(crate) fn first_failing_gate(job: &Job, consultant: &Consultant) -> Option<IneligibilityReason> {
    let job_region = match job.region_id.as_deref() {
        Some(region) => region,
        None => return Some(IneligibilityReason::JobHasNoRegion),
    };
    if consultant.region_id.as_deref() != Some(job_region) {
        return Some(IneligibilityReason::WrongRegion);
    }
    if !consultant.role.can_recruit() {
        return Some(IneligibilityReason::WrongRole);
    }
    if consultant.status != ConsultantStatus::Active {
        return Some(IneligibilityReason::NotActive);
    }
    if consultant.availability == Availability::AtCapacity {
        return Some(IneligibilityReason::AtCapacity);
    }
    if !consultant.has_capacity() {
        return Some(IneligibilityReason::MaxJobsReached);
    }
    None
}

/// 总分降序, 同分按 id 升序
pub(crate) fn rank_order(a: &RankedConsultant, b: &RankedConsultant) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then_with(|| a.consultant_id.cmp(&b.consultant_id))
}
