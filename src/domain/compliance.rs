// ==========================================
// HRM8 销售引擎 - 合规告警值对象
// ==========================================
// 红线: 告警不落库, 每次调用按当前状态重新计算
// ==========================================

use crate::domain::types::{AlertSeverity, AlertType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ComplianceAlert - 合规告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAlert {
    pub id: String, // "<TYPE>:<entity_id>", 同一状态下多次计算结果一致
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub entity_type: String,
    pub entity_id: String,
    pub licensee_id: Option<String>,
    pub title: String,
    pub description: String,
    pub value: f64,
    pub threshold: f64,
    pub detected_at: DateTime<Utc>,
}

impl ComplianceAlert {
    pub fn alert_id(alert_type: AlertType, entity_id: &str) -> String {
        format!("{}:{}", alert_type.as_str(), entity_id)
    }
}

// ==========================================
// ComplianceSummary - 告警汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub total: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub generated_at: DateTime<Utc>,
}

impl ComplianceSummary {
    /// 从告警列表汇总; 所有级别与类型都会出现在结果中 (计数可为 0)
    pub fn from_alerts(alerts: &[ComplianceAlert], generated_at: DateTime<Utc>) -> Self {
        let mut by_severity: BTreeMap<String, usize> = AlertSeverity::all()
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut by_type: BTreeMap<String, usize> = AlertType::all()
            .iter()
            .map(|t| (t.as_str().to_string(), 0))
            .collect();

        for alert in alerts {
            *by_severity
                .entry(alert.severity.as_str().to_string())
                .or_insert(0) += 1;
            *by_type.entry(alert.alert_type.as_str().to_string()).or_insert(0) += 1;
        }

        Self {
            total: alerts.len(),
            by_severity,
            by_type,
            generated_at,
        }
    }
}
