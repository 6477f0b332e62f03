// ==========================================
// HRM8 销售引擎 - 每日清扫编排器
// ==========================================
// 用途: 协调每日定时任务的执行顺序
// 顺序: 佣金过期清扫 -> 合规扫描 -> 续约机会通知
// 红线: 单步失败记入报告, 不中断后续步骤; 核心不退出进程
// ==========================================

use crate::config::EngineConfigReader;
use crate::domain::{ComplianceAlert, ComplianceSummary};
use crate::engine::attribution::{AttributionService, RenewalOpportunity};
use crate::engine::commission::{CommissionEngine, ExpirySweepResult};
use crate::engine::compliance::ComplianceAlertService;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// SweepReport - 每日清扫报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub run_at: DateTime<Utc>,
    pub expiry: ExpirySweepResult,
    pub compliance_alerts: Vec<ComplianceAlert>,
    pub compliance_summary: Option<ComplianceSummary>,
    pub renewal_opportunities: Vec<RenewalOpportunity>,
    /// 步骤级失败 (佣金单条失败见 expiry.errors)
    pub step_errors: Vec<String>,
}

impl SweepReport {
    pub fn has_errors(&self) -> bool {
        self.expiry.has_errors() || !self.step_errors.is_empty()
    }

    /// 0 = 全部成功, 1 = 部分失败
    pub fn status_code(&self) -> i32 {
        if self.has_errors() {
            1
        } else {
            0
        }
    }
}

// ==========================================
// ScheduledSweeps
// ==========================================
pub struct ScheduledSweeps<C>
where
    C: EngineConfigReader,
{
    commissions: Arc<CommissionEngine<C>>,
    compliance: Arc<ComplianceAlertService<C>>,
    attribution: Arc<AttributionService<C>>,
}

impl<C> ScheduledSweeps<C>
where
    C: EngineConfigReader,
{
    pub fn new(
        commissions: Arc<CommissionEngine<C>>,
        compliance: Arc<ComplianceAlertService<C>>,
        attribution: Arc<AttributionService<C>>,
    ) -> Self {
        Self {
            commissions,
            compliance,
            attribution,
        }
    }

    #[instrument(skip(self))]
    pub async fn run_daily(&self, now: DateTime<Utc>) -> SweepReport {
        let mut step_errors = Vec::new();

        // ===== 步骤 1: 佣金过期 =====
        let expiry = self.commissions.run_expiry_sweep(now);

        // ===== 步骤 2: 合规扫描 =====
        let (compliance_alerts, compliance_summary) = match self.compliance.scan(now).await {
            Ok(alerts) => {
                let summary = ComplianceSummary::from_alerts(&alerts, now);
                (alerts, Some(summary))
            }
            Err(e) => {
                warn!(error = %e, "compliance scan failed");
                step_errors.push(format!("compliance scan: {}", e));
                (Vec::new(), None)
            }
        };

        // ===== 步骤 3: 续约机会 =====
        let renewal_opportunities = match self
            .attribution
            .find_renewal_opportunities(None, now)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "renewal scan failed");
                step_errors.push(format!("renewal scan: {}", e));
                Vec::new()
            }
        };

        let report = SweepReport {
            run_at: now,
            expiry,
            compliance_alerts,
            compliance_summary,
            renewal_opportunities,
            step_errors,
        };
        info!(
            expired = report.expiry.total_expired(),
            alerts = report.compliance_alerts.len(),
            renewals = report.renewal_opportunities.len(),
            status_code = report.status_code(),
            "daily sweeps finished"
        );
        report
    }
}
