use crate::domain::Consultant;
use serde::{Deserialize, Serialize};

pub const BASE_SCORE: f64 = 100.0;
pub const WORKLOAD_WEIGHT: f64 = 40.0;
pub const EXPERTISE_BONUS: f64 = 30.0;
pub const SUCCESS_RATE_CAP: f64 = 10.0;
pub const SPEED_WEIGHT: f64 = 10.0;
/// 平均招聘天数达到该值时速度分为 0
pub const SPEED_HORIZON_DAYS: f64 = 60.0;

/// 单个顾问的得分明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub workload: f64,
    pub expertise: f64,
    pub success: f64,
    pub speed: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn describe(&self) -> String {
        let expertise = if self.expertise > 0.0 {
            "industry match"
        } else {
            "no industry match"
        };
        format!(
            "score {:.1}: workload {:.1}/40, {}, success {:.1}/10, speed {:.1}/10",
            self.total, self.workload, expertise, self.success, self.speed
        )
    }
}

pub(crate) fn score_consultant(consultant: &Consultant, job_category: Option<&str>) -> ScoreBreakdown {
    let workload = WORKLOAD_WEIGHT * (1.0 - consultant.workload_ratio());
    let expertise = if expertise_matches(&consultant.industry_expertise, job_category) {
        EXPERTISE_BONUS
    } else {
        0.0
    };
    let success = if consultant.success_rate.is_finite() {
        (consultant.success_rate / 10.0).clamp(0.0, SUCCESS_RATE_CAP)
    } else {
        0.0
    };
    let speed = match consultant.average_days_to_fill {
        Some(days) if days.is_finite() && days > 0.0 => {
            SPEED_WEIGHT * (1.0 - (days / SPEED_HORIZON_DAYS).min(1.0))
        }
        _ => 0.0,
    };

    ScoreBreakdown {
        base: BASE_SCORE,
        workload,
        expertise,
        success,
        speed,
        total: BASE_SCORE + workload + expertise + success + speed,
    }
}

/// 岗位类别与任一专长互相包含 (忽略大小写, 空白专长忽略)
pub(crate) fn expertise_matches(expertise: &[String], job_category: Option<&str>) -> bool {
    let category = match job_category.map(|c| c.trim().to_lowercase()) {
        Some(c) if !c.is_empty() => c,
        _ => return false,
    };
    expertise
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .any(|e| category.contains(&e) || e.contains(&category))
}
