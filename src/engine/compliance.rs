// ==========================================
// HRM8 销售引擎 - 合规告警
// ==========================================
// 职责: 按当前状态实时计算合规告警 (逾期结算/区域不活跃/收入下滑/协议到期)
// 红线: 告警不落库, 同一状态下多次计算结果一致
// 红线: 检测器只读, 不修改任何业务记录
// ==========================================
// 排序: 严重度 (CRITICAL > HIGH > MEDIUM > LOW) -> 检测器顺序 -> entity_id
// ==========================================

use crate::config::EngineConfigReader;
use crate::domain::{
    entity_types, AlertSeverity, AlertType, CommissionType, ComplianceAlert, ComplianceSummary,
    LicenseeStatus, RevenueFilter,
};
use crate::engine::error::ComplianceError;
use crate::engine::events::{OptionalNotificationPublisher, SalesEvent, SalesEventType};
use crate::engine::repositories::SalesRepositories;
use crate::engine::sales_core::SalesCore;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

const SETTLEMENT_ENTITY: &str = "SETTLEMENT";
const REGION_ENTITY: &str = "REGION";

// ==========================================
// ComplianceThresholds - 检测阈值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceThresholds {
    pub overdue_payout_days: i64,
    pub inactive_region_days: i64,
    pub revenue_decline_percent: f64,
    pub agreement_expiry_warning_days: i64,
}

impl Default for ComplianceThresholds {
    fn default() -> Self {
        Self {
            overdue_payout_days: 30,
            inactive_region_days: 60,
            revenue_decline_percent: 20.0,
            agreement_expiry_warning_days: 30,
        }
    }
}

impl ComplianceThresholds {
    pub async fn load<C: EngineConfigReader>(config: &C) -> Result<Self, ComplianceError> {
        Ok(Self {
            overdue_payout_days: config.get_overdue_payout_days().await?,
            inactive_region_days: config.get_inactive_region_days().await?,
            revenue_decline_percent: config.get_revenue_decline_percent().await?,
            agreement_expiry_warning_days: config.get_agreement_expiry_warning_days().await?,
        })
    }
}

// ==========================================
// 严重度规则 (纯函数)
// ==========================================

pub fn overdue_payout_severity(days_overdue: i64) -> AlertSeverity {
    if days_overdue > 60 {
        AlertSeverity::Critical
    } else if days_overdue > 45 {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    }
}

pub fn revenue_decline_severity(decline_percent: f64) -> AlertSeverity {
    if decline_percent > 40.0 {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    }
}

/// days_remaining 为负表示已过期; 超出提醒窗口返回 None
pub fn agreement_expiry_severity(days_remaining: i64, warning_days: i64) -> Option<AlertSeverity> {
    if days_remaining < 0 {
        Some(AlertSeverity::Critical)
    } else if days_remaining < 7 {
        Some(AlertSeverity::High)
    } else if days_remaining <= warning_days {
        Some(AlertSeverity::Medium)
    } else {
        None
    }
}

/// 下滑百分比; 基期为 0 时无法计算
pub fn decline_percent(earlier: Decimal, later: Decimal) -> Option<f64> {
    if earlier <= Decimal::ZERO {
        return None;
    }
    ((earlier - later) / earlier * Decimal::ONE_HUNDRED).to_f64()
}

pub fn sort_alerts(alerts: &mut [ComplianceAlert]) {
    alerts.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| a.alert_type.rank().cmp(&b.alert_type.rank()))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
}

// ==========================================
// ComplianceAlertService
// ==========================================
pub struct ComplianceAlertService<C>
where
    C: EngineConfigReader,
{
    repos: SalesRepositories,
    config: Arc<C>,
    notifier: OptionalNotificationPublisher,
}

impl<C> ComplianceAlertService<C>
where
    C: EngineConfigReader,
{
    pub fn new(
        repos: SalesRepositories,
        config: Arc<C>,
        notifier: OptionalNotificationPublisher,
    ) -> Self {
        Self {
            repos,
            config,
            notifier,
        }
    }

    /// 运行全部检测器, 排序后返回; CRITICAL 告警尽力通知
    #[instrument(skip(self))]
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        let alerts = self.detect_all(now).await?;
        self.notify_critical(&alerts);
        tracing::info!(alerts = alerts.len(), "compliance scan finished");
        Ok(alerts)
    }

    /// 仅返回与指定被许可方相关的告警
    #[instrument(skip(self))]
    pub async fn scan_for_licensee(
        &self,
        licensee_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        if self.repos.licensees.find_by_id(licensee_id)?.is_none() {
            return Err(ComplianceError::LicenseeNotFound(licensee_id.to_string()));
        }
        let alerts: Vec<ComplianceAlert> = self
            .detect_all(now)
            .await?
            .into_iter()
            .filter(|a| a.licensee_id.as_deref() == Some(licensee_id))
            .collect();
        self.notify_critical(&alerts);
        Ok(alerts)
    }

    pub async fn summary(&self, now: DateTime<Utc>) -> Result<ComplianceSummary, ComplianceError> {
        let alerts = self.detect_all(now).await?;
        Ok(ComplianceSummary::from_alerts(&alerts, now))
    }

    async fn detect_all(&self, now: DateTime<Utc>) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        let thresholds = ComplianceThresholds::load(self.config.as_ref()).await?;
        let mut alerts = Vec::new();
        alerts.extend(self.detect_overdue_payouts(&thresholds, now)?);
        alerts.extend(self.detect_inactive_regions(&thresholds, now)?);
        alerts.extend(self.detect_revenue_declines(&thresholds, now)?);
        alerts.extend(self.detect_expiring_agreements(&thresholds, now)?);
        sort_alerts(&mut alerts);
        Ok(alerts)
    }

    fn notify_critical(&self, alerts: &[ComplianceAlert]) {
        for alert in alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
        {
            let mut event = SalesEvent::new(
                SalesEventType::ComplianceCritical,
                &alert.entity_type,
                &alert.entity_id,
            )
            .with_payload(json!({
                "alert_id": alert.id,
                "alert_type": alert.alert_type.as_str(),
                "title": alert.title,
            }));
            if let Some(licensee_id) = &alert.licensee_id {
                event = event.to_recipient(licensee_id.clone());
            }
            self.notifier.notify(event);
        }
    }

    // ==========================================
    // 检测器
    // ==========================================

    /// PENDING 结算单生成后超过阈值天数未支付
    pub fn detect_overdue_payouts(
        &self,
        thresholds: &ComplianceThresholds,
        now: DateTime<Utc>,
    ) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        let mut alerts = Vec::new();
        for settlement in self.repos.settlements.list_pending()? {
            let days = (now - settlement.generated_at).num_days();
            if days <= thresholds.overdue_payout_days {
                continue;
            }
            alerts.push(ComplianceAlert {
                id: ComplianceAlert::alert_id(AlertType::OverduePayout, &settlement.id),
                alert_type: AlertType::OverduePayout,
                severity: overdue_payout_severity(days),
                entity_type: SETTLEMENT_ENTITY.to_string(),
                entity_id: settlement.id.clone(),
                licensee_id: Some(settlement.licensee_id.clone()),
                title: "Overdue licensee payout".to_string(),
                description: format!(
                    "settlement of {} pending for {} days",
                    settlement.total_amount, days
                ),
                value: days as f64,
                threshold: thresholds.overdue_payout_days as f64,
                detected_at: now,
            });
        }
        Ok(alerts)
    }

    /// 被许可方区域在窗口内没有新增入职佣金
    pub fn detect_inactive_regions(
        &self,
        thresholds: &ComplianceThresholds,
        now: DateTime<Utc>,
    ) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        let since = thresholds
            .inactive_region_days
            .checked_neg()
            .and_then(|days| SalesCore::shift_days(now, days))
            .ok_or(ComplianceError::WindowOutOfRange(thresholds.inactive_region_days))?;
        let mut alerts = Vec::new();
        for region in self.repos.regions.list_all()? {
            if !region.is_active || !region.is_licensee_owned() {
                continue;
            }
            let placements =
                self.repos
                    .commissions
                    .count_created_since(&region.id, CommissionType::Placement, since)?;
            if placements > 0 {
                continue;
            }
            tracing::debug!(region_id = %region.id, "region has no recent placements");
            alerts.push(ComplianceAlert {
                id: ComplianceAlert::alert_id(AlertType::InactiveRegion, &region.id),
                alert_type: AlertType::InactiveRegion,
                severity: AlertSeverity::Medium,
                entity_type: REGION_ENTITY.to_string(),
                entity_id: region.id.clone(),
                licensee_id: region.licensee_id.clone(),
                title: "Inactive region".to_string(),
                description: format!(
                    "no placements in {} for {} days",
                    region.name, thresholds.inactive_region_days
                ),
                value: 0.0,
                threshold: thresholds.inactive_region_days as f64,
                detected_at: now,
            });
        }
        Ok(alerts)
    }

    /// 上月收入较上上月下滑超过阈值
    pub fn detect_revenue_declines(
        &self,
        thresholds: &ComplianceThresholds,
        now: DateTime<Utc>,
    ) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        let Some(((last_start, last_end), (prev_start, prev_end))) =
            SalesCore::previous_two_months(now.date_naive())
        else {
            return Ok(Vec::new());
        };
        let sum_between = |records: &[crate::domain::RegionalRevenue],
                           start: NaiveDate,
                           end: NaiveDate| {
            records
                .iter()
                .filter(|r| r.period_start >= start && r.period_start <= end)
                .map(|r| r.total_revenue)
                .sum::<Decimal>()
        };

        let mut alerts = Vec::new();
        for region in self.repos.regions.list_all()? {
            if !region.is_active || !region.is_licensee_owned() {
                continue;
            }
            let records = self.repos.revenues.query(&RevenueFilter {
                region_id: Some(region.id.clone()),
                overlaps: Some((prev_start, last_end)),
                ..Default::default()
            })?;
            let earlier = sum_between(&records, prev_start, prev_end);
            let later = sum_between(&records, last_start, last_end);
            let Some(decline) = decline_percent(earlier, later) else {
                continue;
            };
            if decline < thresholds.revenue_decline_percent {
                continue;
            }
            alerts.push(ComplianceAlert {
                id: ComplianceAlert::alert_id(AlertType::RevenueDecline, &region.id),
                alert_type: AlertType::RevenueDecline,
                severity: revenue_decline_severity(decline),
                entity_type: REGION_ENTITY.to_string(),
                entity_id: region.id.clone(),
                licensee_id: region.licensee_id.clone(),
                title: "Regional revenue decline".to_string(),
                description: format!(
                    "revenue fell from {} to {} ({:.1}%)",
                    earlier, later, decline
                ),
                value: decline,
                threshold: thresholds.revenue_decline_percent,
                detected_at: now,
            });
        }
        Ok(alerts)
    }

    /// ACTIVE 被许可方协议已过期或即将到期
    pub fn detect_expiring_agreements(
        &self,
        thresholds: &ComplianceThresholds,
        now: DateTime<Utc>,
    ) -> Result<Vec<ComplianceAlert>, ComplianceError> {
        let today = now.date_naive();
        let mut alerts = Vec::new();
        for licensee in self.repos.licensees.list_all()? {
            if licensee.status != LicenseeStatus::Active {
                continue;
            }
            let Some(end) = licensee.agreement_end_date else {
                continue;
            };
            let days_remaining = (end - today).num_days();
            let Some(severity) =
                agreement_expiry_severity(days_remaining, thresholds.agreement_expiry_warning_days)
            else {
                continue;
            };
            let description = if days_remaining < 0 {
                format!("agreement expired on {}", end.format("%Y-%m-%d"))
            } else {
                format!(
                    "agreement ends on {} ({} days)",
                    end.format("%Y-%m-%d"),
                    days_remaining
                )
            };
            alerts.push(ComplianceAlert {
                id: ComplianceAlert::alert_id(AlertType::AgreementExpiry, &licensee.id),
                alert_type: AlertType::AgreementExpiry,
                severity,
                entity_type: entity_types::REGIONAL_LICENSEE.to_string(),
                entity_id: licensee.id.clone(),
                licensee_id: Some(licensee.id.clone()),
                title: "Licensee agreement expiry".to_string(),
                description,
                value: days_remaining as f64,
                threshold: thresholds.agreement_expiry_warning_days as f64,
                detected_at: now,
            });
        }
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Commission, CommissionStatus, RegionalRevenue, RevenueStatus, Settlement, SettlementStatus,
    };
    use crate::engine::test_support::{date, fixture, seed_licensee, seed_region, ts, Fixture};

    fn service(fx: &Fixture) -> ComplianceAlertService<crate::config::ConfigManager> {
        ComplianceAlertService::new(fx.repos.clone(), fx.config.clone(), fx.notifier.clone())
    }

    fn seed_settlement(fx: &Fixture, id: &str, licensee: &str, generated_at: DateTime<Utc>) {
        fx.repos
            .settlements
            .insert(&Settlement {
                id: id.to_string(),
                licensee_id: licensee.to_string(),
                period_start: date(2026, 1, 1),
                period_end: date(2026, 1, 31),
                total_amount: Decimal::new(1000, 0),
                status: SettlementStatus::Pending,
                generated_at,
                paid_at: None,
            })
            .unwrap();
    }

    fn seed_revenue(fx: &Fixture, id: &str, region: &str, month: u32, total: i64) {
        let now = ts(2026, 6, 1);
        fx.repos
            .revenues
            .insert_checked(&RegionalRevenue {
                id: id.to_string(),
                region_id: region.to_string(),
                licensee_id: Some("L1".to_string()),
                period_start: date(2026, month, 1),
                period_end: date(2026, month, 20),
                total_revenue: Decimal::new(total, 0),
                licensee_share: Decimal::ZERO,
                hrm8_share: Decimal::new(total, 0),
                status: RevenueStatus::Pending,
                paid_at: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    fn seed_placement(fx: &Fixture, region: &str, created_at: DateTime<Utc>) {
        fx.repos
            .commissions
            .insert_if_absent(&Commission {
                id: format!("P-{}", region),
                consultant_id: "CO1".to_string(),
                job_id: Some(format!("J-{}", region)),
                region_id: Some(region.to_string()),
                subscription_id: None,
                commission_type: CommissionType::Placement,
                amount: Decimal::new(100, 0),
                rate: Decimal::new(10, 2),
                status: CommissionStatus::Pending,
                commission_expiry_date: None,
                notes: None,
                paid_at: None,
                created_at,
                updated_at: created_at,
            })
            .unwrap();
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(overdue_payout_severity(31), AlertSeverity::Medium);
        assert_eq!(overdue_payout_severity(46), AlertSeverity::High);
        assert_eq!(overdue_payout_severity(61), AlertSeverity::Critical);
        assert_eq!(revenue_decline_severity(20.0), AlertSeverity::Medium);
        assert_eq!(revenue_decline_severity(40.5), AlertSeverity::High);
        assert_eq!(agreement_expiry_severity(-1, 30), Some(AlertSeverity::Critical));
        assert_eq!(agreement_expiry_severity(6, 30), Some(AlertSeverity::High));
        assert_eq!(agreement_expiry_severity(30, 30), Some(AlertSeverity::Medium));
        assert_eq!(agreement_expiry_severity(31, 30), None);
        assert_eq!(decline_percent(Decimal::ZERO, Decimal::ONE), None);
        assert_eq!(
            decline_percent(Decimal::new(100, 0), Decimal::new(75, 0)),
            Some(25.0)
        );
    }

    #[tokio::test]
    async fn test_overdue_settlement_detection() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 10, None);
        seed_settlement(&fx, "S_NEW", "L1", ts(2026, 5, 20));
        seed_settlement(&fx, "S_OLD", "L1", ts(2026, 3, 1));

        let svc = service(&fx);
        let thresholds = ComplianceThresholds::default();
        let alerts = svc
            .detect_overdue_payouts(&thresholds, ts(2026, 6, 1))
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].entity_id, "S_OLD");
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].id, "OVERDUE_PAYOUT:S_OLD");
    }

    #[tokio::test]
    async fn test_inactive_region_ignores_owned_regions() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 10, None);
        seed_region(&fx, "R_DORMANT", Some("L1"));
        seed_region(&fx, "R_BUSY", Some("L1"));
        seed_region(&fx, "R_HQ", None);
        seed_placement(&fx, "R_BUSY", ts(2026, 5, 15));

        let alerts = service(&fx)
            .detect_inactive_regions(&ComplianceThresholds::default(), ts(2026, 6, 1))
            .unwrap();
        let ids: Vec<_> = alerts.iter().map(|a| a.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["R_DORMANT"]);
    }

    #[tokio::test]
    async fn test_inactive_window_out_of_range_is_error() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 10, None);
        seed_region(&fx, "R1", Some("L1"));

        let thresholds = ComplianceThresholds {
            inactive_region_days: i64::MAX,
            ..ComplianceThresholds::default()
        };
        let err = service(&fx)
            .detect_inactive_regions(&thresholds, ts(2026, 6, 1))
            .unwrap_err();
        assert!(matches!(err, ComplianceError::WindowOutOfRange(i64::MAX)));
    }

    #[tokio::test]
    async fn test_revenue_decline_compares_previous_two_months() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 10, None);
        seed_region(&fx, "R1", Some("L1"));
        seed_region(&fx, "R2", Some("L1"));
        // 今天 2026-06-10: 上月 = 5 月, 上上月 = 4 月
        seed_revenue(&fx, "RV1", "R1", 4, 10_000);
        seed_revenue(&fx, "RV2", "R1", 5, 5_000);
        seed_revenue(&fx, "RV3", "R2", 4, 10_000);
        seed_revenue(&fx, "RV4", "R2", 5, 9_000);

        let alerts = service(&fx)
            .detect_revenue_declines(&ComplianceThresholds::default(), ts(2026, 6, 10))
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].entity_id, "R1");
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert!((alerts[0].value - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_scan_sorts_and_filters_by_licensee() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 10, Some(date(2026, 5, 30)));
        seed_licensee(&fx, "L2", 10, Some(date(2026, 6, 20)));
        seed_region(&fx, "R1", Some("L2"));
        seed_placement(&fx, "R1", ts(2026, 5, 30));

        let svc = service(&fx);
        let alerts = svc.scan(ts(2026, 6, 1)).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].entity_id, "L1");
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[1].entity_id, "L2");
        assert_eq!(alerts[1].severity, AlertSeverity::Medium);

        let only_l2 = svc.scan_for_licensee("L2", ts(2026, 6, 1)).await.unwrap();
        assert_eq!(only_l2.len(), 1);
        assert!(matches!(
            svc.scan_for_licensee("NOPE", ts(2026, 6, 1)).await,
            Err(ComplianceError::LicenseeNotFound(_))
        ));

        let summary = svc.summary(ts(2026, 6, 1)).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_severity["CRITICAL"], 1);
        assert_eq!(summary.by_type["AGREEMENT_EXPIRY"], 2);
        assert_eq!(summary.by_type["OVERDUE_PAYOUT"], 0);
    }
}
