// ==========================================
// HRM8 销售引擎 - 客户公司领域模型
// ==========================================
// 职责: 归属 (attribution) 相关的公司字段子集
// 红线: attribution_locked_at 有值 <=> attribution_locked = true
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Company - 客户公司
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub region_id: Option<String>,

    // ===== 归属信息 =====
    pub referred_by: Option<String>, // 获得归属的顾问 (弱引用)
    pub attribution_locked: bool,
    pub attribution_locked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// 创建未归属的公司
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            region_id: None,
            referred_by: None,
            attribution_locked: false,
            attribution_locked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 锁定字段是否自洽
    pub fn lock_fields_consistent(&self) -> bool {
        self.attribution_locked == self.attribution_locked_at.is_some()
    }

    /// 当前归属快照 (用于条件更新)
    pub fn attribution_state(&self) -> AttributionState {
        AttributionState {
            referred_by: self.referred_by.clone(),
            attribution_locked: self.attribution_locked,
            attribution_locked_at: self.attribution_locked_at,
        }
    }
}

// ==========================================
// AttributionState - 归属三元组
// ==========================================
// 仓储层按 "期望值 -> 新值" 做比较并交换, 避免并发丢失更新
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionState {
    pub referred_by: Option<String>,
    pub attribution_locked: bool,
    pub attribution_locked_at: Option<DateTime<Utc>>,
}

impl AttributionState {
    /// 保持锁定字段不变, 只替换归属顾问
    pub fn with_referrer(&self, agent_id: &str) -> Self {
        Self {
            referred_by: Some(agent_id.to_string()),
            ..self.clone()
        }
    }

    /// 以 locked_at 为起点重新加锁
    pub fn locked_at(&self, locked_at: DateTime<Utc>) -> Self {
        Self {
            referred_by: self.referred_by.clone(),
            attribution_locked: true,
            attribution_locked_at: Some(locked_at),
        }
    }

    /// 同时清空锁定标志和时间
    pub fn unlocked(&self) -> Self {
        Self {
            referred_by: self.referred_by.clone(),
            attribution_locked: false,
            attribution_locked_at: None,
        }
    }
}

// ==========================================
// CompanyPatch - 公司字段补丁
// ==========================================
// None 表示保持不变; 归属字段只能通过 AttributionService 修改
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub region_id: Option<Option<String>>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.region_id.is_none()
    }

    pub fn apply(&self, company: &mut Company) {
        if let Some(name) = &self.name {
            company.name = name.clone();
        }
        if let Some(region_id) = &self.region_id {
            company.region_id = region_id.clone();
        }
    }
}
