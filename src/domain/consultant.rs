// ==========================================
// HRM8 销售引擎 - 顾问领域模型
// ==========================================
// 职责: 顾问主数据 + 顾问与岗位的分配关系
// 红线: current_jobs 只能由分配/解除分配操作修改
// ==========================================

use crate::domain::types::{
    AssignmentSource, AssignmentStatus, Availability, ConsultantRole, ConsultantStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Consultant - 顾问
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultant {
    pub id: String,
    pub name: String,
    pub role: ConsultantRole,
    pub status: ConsultantStatus,
    pub availability: Availability,
    pub region_id: Option<String>,

    // ===== 产能 =====
    pub current_jobs: i32,
    pub max_jobs: i32,

    // ===== 绩效 =====
    pub industry_expertise: Vec<String>,
    pub success_rate: f64,                // 0-100
    pub average_days_to_fill: Option<f64>, // 天
    pub default_commission_rate: Option<Decimal>, // 小数, 例如 0.10

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consultant {
    /// 是否还有剩余产能
    pub fn has_capacity(&self) -> bool {
        self.current_jobs < self.max_jobs
    }

    /// 负载比例; max_jobs = 0 视为满载
    pub fn workload_ratio(&self) -> f64 {
        if self.max_jobs <= 0 {
            return 1.0;
        }
        (self.current_jobs as f64 / self.max_jobs as f64).clamp(0.0, 1.0)
    }
}

// ==========================================
// ConsultantPatch - 顾问字段补丁
// ==========================================
// 不包含 current_jobs; 产能计数只走分配操作
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsultantPatch {
    pub name: Option<String>,
    pub role: Option<ConsultantRole>,
    pub status: Option<ConsultantStatus>,
    pub availability: Option<Availability>,
    pub region_id: Option<Option<String>>,
    pub max_jobs: Option<i32>,
    pub industry_expertise: Option<Vec<String>>,
    pub success_rate: Option<f64>,
    pub average_days_to_fill: Option<Option<f64>>,
    pub default_commission_rate: Option<Option<Decimal>>,
}

impl ConsultantPatch {
    pub fn apply(&self, consultant: &mut Consultant) {
        if let Some(v) = &self.name {
            consultant.name = v.clone();
        }
        if let Some(v) = self.role {
            consultant.role = v;
        }
        if let Some(v) = self.status {
            consultant.status = v;
        }
        if let Some(v) = self.availability {
            consultant.availability = v;
        }
        if let Some(v) = &self.region_id {
            consultant.region_id = v.clone();
        }
        if let Some(v) = self.max_jobs {
            consultant.max_jobs = v.max(0);
        }
        if let Some(v) = &self.industry_expertise {
            consultant.industry_expertise = v.clone();
        }
        if let Some(v) = self.success_rate {
            consultant.success_rate = v.clamp(0.0, 100.0);
        }
        if let Some(v) = self.average_days_to_fill {
            consultant.average_days_to_fill = v;
        }
        if let Some(v) = self.default_commission_rate {
            consultant.default_commission_rate = v;
        }
    }
}

// ==========================================
// ConsultantJobAssignment - 顾问岗位分配关系
// ==========================================
// (consultant_id, job_id) 唯一; 重新分配时置 INACTIVE, 不物理删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultantJobAssignment {
    pub id: String,
    pub consultant_id: String,
    pub job_id: String,
    pub status: AssignmentStatus,
    pub assignment_source: AssignmentSource,
    pub pipeline_stage: Option<String>,
    pub pipeline_progress: i32, // 0-100
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
