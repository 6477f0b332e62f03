// ==========================================
// HRM8 销售引擎 - 区域收入分账台账
// ==========================================
// 职责: 区域收入记录的分账计算、编辑、状态迁移、查询汇总
// 红线: total_revenue = licensee_share + hrm8_share (精确相等)
// 红线: HRM8 自营区域 licensee_share 恒为 0
// 红线: 同一区域的期间不得重叠; 仅 PENDING 可编辑
// ==========================================
// 状态机: PENDING -> CONFIRMED -> PAID (不可跳级, paid_at 仅在 PAID 时写入)
// ==========================================

use crate::domain::{
    entity_types, AuditAction, Region, RegionalRevenue, RevenueDraft, RevenueFilter,
    RevenuePatch, RevenueSplitInput, RevenueStatus, RevenueSummary,
};
use crate::engine::audit::AuditRecorder;
use crate::engine::error::LedgerError;
use crate::engine::events::{OptionalNotificationPublisher, SalesEvent, SalesEventType};
use crate::engine::repositories::SalesRepositories;
use crate::engine::sales_core::SalesCore;
use crate::repository::RevenueWriteOutcome;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// RegionalRevenueLedger
// ==========================================
pub struct RegionalRevenueLedger {
    repos: SalesRepositories,
    audit: AuditRecorder,
    notifier: OptionalNotificationPublisher,
}

impl RegionalRevenueLedger {
    pub fn new(repos: SalesRepositories, notifier: OptionalNotificationPublisher) -> Self {
        Self {
            audit: AuditRecorder::new(repos.audit.clone()),
            repos,
            notifier,
        }
    }

    fn load(&self, revenue_id: &str) -> Result<RegionalRevenue, LedgerError> {
        self.repos
            .revenues
            .find_by_id(revenue_id)?
            .ok_or_else(|| LedgerError::NotFound(revenue_id.to_string()))
    }

    fn load_region(&self, region_id: &str) -> Result<Region, LedgerError> {
        self.repos
            .regions
            .find_by_id(region_id)?
            .ok_or_else(|| LedgerError::RegionNotFound(region_id.to_string()))
    }

    // ==========================================
    // 分账计算
    // ==========================================

    /// 计算 (licensee_share, hrm8_share)
    ///
    /// # 规则
    /// - total 先按分舍入 (round2), 两份额之和等于舍入后的 total
    /// - 自营区域: (0, total); 显式给出非零被许可方份额视为错误
    /// - 显式分账: 两者之和必须精确等于 total
    /// - 按被许可方比例: licensee = round2(total × pct / 100), hrm8 = total − licensee
    pub fn compute_split(
        &self,
        region: &Region,
        total: Decimal,
        split: &RevenueSplitInput,
    ) -> Result<(Decimal, Decimal), LedgerError> {
        if total < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(total));
        }
        let total = SalesCore::round_money(total);

        let (licensee_share, hrm8_share) = match (&region.licensee_id, split) {
            (None, RevenueSplitInput::Explicit { licensee_share, .. })
                if !licensee_share.is_zero() =>
            {
                return Err(LedgerError::LicenseeShareOnOwnedRegion(region.id.clone()));
            }
            (None, RevenueSplitInput::Explicit { hrm8_share, .. }) => (Decimal::ZERO, *hrm8_share),
            (None, RevenueSplitInput::FromLicensee) => (Decimal::ZERO, total),
            (Some(_), RevenueSplitInput::Explicit {
                licensee_share,
                hrm8_share,
            }) => (*licensee_share, *hrm8_share),
            (Some(licensee_id), RevenueSplitInput::FromLicensee) => {
                let licensee = self
                    .repos
                    .licensees
                    .find_by_id(licensee_id)?
                    .ok_or_else(|| LedgerError::LicenseeNotFound(licensee_id.clone()))?;
                let percent = licensee
                    .revenue_share_percent
                    .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                SalesCore::split_by_percent(total, percent)
            }
        };

        for share in [licensee_share, hrm8_share] {
            if share < Decimal::ZERO {
                return Err(LedgerError::NegativeAmount(share));
            }
        }
        if licensee_share + hrm8_share != total {
            tracing::error!(
                region_id = %region.id,
                %total,
                %licensee_share,
                %hrm8_share,
                "revenue split does not balance"
            );
            return Err(LedgerError::SplitMismatch {
                total_revenue: total,
                licensee_share,
                hrm8_share,
            });
        }
        Ok((licensee_share, hrm8_share))
    }

    fn check_period(start: NaiveDate, end: NaiveDate) -> Result<(), LedgerError> {
        if start > end {
            return Err(LedgerError::InvalidPeriod { start, end });
        }
        Ok(())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 新增区域收入记录 (PENDING)
    #[instrument(skip(self, draft), fields(region_id = %draft.region_id))]
    pub fn record(
        &self,
        draft: RevenueDraft,
        now: DateTime<Utc>,
    ) -> Result<RegionalRevenue, LedgerError> {
        Self::check_period(draft.period_start, draft.period_end)?;
        let region = self.load_region(&draft.region_id)?;
        let total_revenue = SalesCore::round_money(draft.total_revenue);
        let (licensee_share, hrm8_share) =
            self.compute_split(&region, total_revenue, &draft.split)?;

        let revenue = RegionalRevenue {
            id: Uuid::new_v4().to_string(),
            region_id: region.id.clone(),
            licensee_id: region.licensee_id.clone(),
            period_start: draft.period_start,
            period_end: draft.period_end,
            total_revenue,
            licensee_share,
            hrm8_share,
            status: RevenueStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };

        match self.repos.revenues.insert_checked(&revenue)? {
            RevenueWriteOutcome::Written => {
                tracing::info!(
                    revenue_id = %revenue.id,
                    total = %revenue.total_revenue,
                    licensee_share = %revenue.licensee_share,
                    "revenue recorded"
                );
                Ok(revenue)
            }
            RevenueWriteOutcome::Overlap { conflicting_id } => Err(LedgerError::PeriodOverlap {
                region_id: region.id,
                conflicting_id,
            }),
            RevenueWriteOutcome::NotPending | RevenueWriteOutcome::NotFound => {
                Err(LedgerError::NotFound(revenue.id))
            }
        }
    }

    /// 编辑 PENDING 记录
    ///
    /// 金额变化但未给出分账时, 按区域归属重新计算 (被许可方比例 / 自营全额)
    #[instrument(skip(self, patch))]
    pub fn update(
        &self,
        revenue_id: &str,
        patch: RevenuePatch,
        now: DateTime<Utc>,
    ) -> Result<RegionalRevenue, LedgerError> {
        let mut revenue = self.load(revenue_id)?;
        if revenue.status != RevenueStatus::Pending {
            return Err(LedgerError::NotEditable {
                revenue_id: revenue_id.to_string(),
                status: revenue.status,
            });
        }

        if let Some(start) = patch.period_start {
            revenue.period_start = start;
        }
        if let Some(end) = patch.period_end {
            revenue.period_end = end;
        }
        Self::check_period(revenue.period_start, revenue.period_end)?;

        let new_total = patch.total_revenue.map(SalesCore::round_money);
        let total_changed = new_total
            .map(|t| t != revenue.total_revenue)
            .unwrap_or(false);
        if let Some(total) = new_total {
            revenue.total_revenue = total;
        }
        let split = match patch.split {
            Some(split) => Some(split),
            None if total_changed => Some(RevenueSplitInput::FromLicensee),
            None => None,
        };
        if let Some(split) = split {
            let region = self.load_region(&revenue.region_id)?;
            let (licensee_share, hrm8_share) =
                self.compute_split(&region, revenue.total_revenue, &split)?;
            revenue.licensee_share = licensee_share;
            revenue.hrm8_share = hrm8_share;
            revenue.licensee_id = region.licensee_id;
        }
        revenue.updated_at = now;

        match self.repos.revenues.update_checked(&revenue)? {
            RevenueWriteOutcome::Written => {
                tracing::info!(total = %revenue.total_revenue, "revenue updated");
                Ok(revenue)
            }
            RevenueWriteOutcome::Overlap { conflicting_id } => Err(LedgerError::PeriodOverlap {
                region_id: revenue.region_id,
                conflicting_id,
            }),
            RevenueWriteOutcome::NotPending => {
                let current = self.load(revenue_id)?;
                Err(LedgerError::NotEditable {
                    revenue_id: revenue_id.to_string(),
                    status: current.status,
                })
            }
            RevenueWriteOutcome::NotFound => Err(LedgerError::NotFound(revenue_id.to_string())),
        }
    }

    // ==========================================
    // 状态迁移
    // ==========================================

    fn transition(
        &self,
        revenue_id: &str,
        expected: RevenueStatus,
        next: RevenueStatus,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<RegionalRevenue, LedgerError> {
        let mut revenue = self.load(revenue_id)?;
        if revenue.status == next {
            return Ok(revenue);
        }
        if revenue.status != expected {
            return Err(LedgerError::InvalidTransition {
                revenue_id: revenue_id.to_string(),
                from: revenue.status,
                to: next,
            });
        }

        let paid_at = (next == RevenueStatus::Paid).then_some(now);
        if !self
            .repos
            .revenues
            .update_status_if(revenue_id, expected, next, paid_at, now)?
        {
            let current = self.load(revenue_id)?;
            if current.status == next {
                return Ok(current);
            }
            return Err(LedgerError::InvalidTransition {
                revenue_id: revenue_id.to_string(),
                from: current.status,
                to: next,
            });
        }

        let (action, event_type) = match next {
            RevenueStatus::Paid => (AuditAction::RevenuePaid, SalesEventType::RevenuePaid),
            _ => (AuditAction::RevenueConfirmed, SalesEventType::RevenueConfirmed),
        };
        self.audit.record_change(
            entity_types::REGIONAL_REVENUE,
            revenue_id,
            action,
            json!({ "status": expected.to_db_str() }),
            json!({ "status": next.to_db_str(), "paid_at": paid_at }),
            performed_by,
            now,
        );
        let mut event = SalesEvent::new(event_type, entity_types::REGIONAL_REVENUE, revenue_id)
            .with_payload(json!({ "licensee_share": revenue.licensee_share.to_string() }));
        if let Some(licensee_id) = &revenue.licensee_id {
            event = event.to_recipient(licensee_id.clone());
        }
        self.notifier.notify(event);
        tracing::info!(revenue_id, from = %expected, to = %next, "revenue transitioned");

        revenue.status = next;
        if paid_at.is_some() {
            revenue.paid_at = paid_at;
        }
        revenue.updated_at = now;
        Ok(revenue)
    }

    /// PENDING -> CONFIRMED; 已确认时为无操作
    #[instrument(skip(self))]
    pub fn confirm(
        &self,
        revenue_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<RegionalRevenue, LedgerError> {
        self.transition(
            revenue_id,
            RevenueStatus::Pending,
            RevenueStatus::Confirmed,
            performed_by,
            now,
        )
    }

    /// CONFIRMED -> PAID; 已支付时为无操作
    #[instrument(skip(self))]
    pub fn mark_paid(
        &self,
        revenue_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<RegionalRevenue, LedgerError> {
        self.transition(
            revenue_id,
            RevenueStatus::Confirmed,
            RevenueStatus::Paid,
            performed_by,
            now,
        )
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn query(&self, filter: &RevenueFilter) -> Result<Vec<RegionalRevenue>, LedgerError> {
        Ok(self.repos.revenues.query(filter)?)
    }

    pub fn summarize(&self, filter: &RevenueFilter) -> Result<RevenueSummary, LedgerError> {
        let records = self.query(filter)?;
        let summary = records.iter().fold(
            RevenueSummary {
                record_count: 0,
                total_revenue: Decimal::ZERO,
                licensee_share: Decimal::ZERO,
                hrm8_share: Decimal::ZERO,
            },
            |mut acc, r| {
                acc.record_count += 1;
                acc.total_revenue += r.total_revenue;
                acc.licensee_share += r.licensee_share;
                acc.hrm8_share += r.hrm8_share;
                acc
            },
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{date, fixture, seed_licensee, seed_region, ts, Fixture};

    fn ledger(fx: &Fixture) -> RegionalRevenueLedger {
        RegionalRevenueLedger::new(fx.repos.clone(), fx.notifier.clone())
    }

    fn draft(region: &str, month: u32, total: Decimal, split: RevenueSplitInput) -> RevenueDraft {
        RevenueDraft {
            region_id: region.to_string(),
            period_start: date(2026, month, 1),
            period_end: date(2026, month, 28),
            total_revenue: total,
            split,
        }
    }

    #[test]
    fn test_fifteen_percent_split() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 15, None);
        seed_region(&fx, "R1", Some("L1"));

        let revenue = ledger(&fx)
            .record(
                draft("R1", 1, Decimal::new(100_000, 0), RevenueSplitInput::FromLicensee),
                ts(2026, 2, 1),
            )
            .unwrap();
        assert_eq!(revenue.licensee_share, Decimal::new(1_500_000, 2));
        assert_eq!(revenue.hrm8_share, Decimal::new(8_500_000, 2));
        assert_eq!(revenue.licensee_id.as_deref(), Some("L1"));
        assert!(revenue.is_balanced());
    }

    #[test]
    fn test_sub_cent_total_is_rounded_before_split() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 100, None);
        seed_region(&fx, "R1", Some("L1"));

        let revenue = ledger(&fx)
            .record(
                draft("R1", 1, Decimal::new(100_005, 3), RevenueSplitInput::FromLicensee),
                ts(2026, 2, 1),
            )
            .unwrap();
        assert_eq!(revenue.total_revenue, Decimal::new(10_001, 2));
        assert_eq!(revenue.licensee_share, Decimal::new(10_001, 2));
        assert!(revenue.hrm8_share.is_zero());
        assert!(revenue.is_balanced());
    }

    #[test]
    fn test_owned_region_keeps_everything() {
        let fx = fixture();
        seed_region(&fx, "R_HQ", None);
        let l = ledger(&fx);

        let revenue = l
            .record(
                draft("R_HQ", 1, Decimal::new(5000, 0), RevenueSplitInput::FromLicensee),
                ts(2026, 2, 1),
            )
            .unwrap();
        assert!(revenue.licensee_share.is_zero());
        assert_eq!(revenue.hrm8_share, Decimal::new(5000, 0));

        let err = l
            .record(
                draft(
                    "R_HQ",
                    2,
                    Decimal::new(5000, 0),
                    RevenueSplitInput::Explicit {
                        licensee_share: Decimal::new(100, 0),
                        hrm8_share: Decimal::new(4900, 0),
                    },
                ),
                ts(2026, 3, 1),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::LicenseeShareOnOwnedRegion(_)));
    }

    #[test]
    fn test_explicit_mismatch_and_negative_rejected() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 20, None);
        seed_region(&fx, "R1", Some("L1"));
        let l = ledger(&fx);

        let err = l
            .record(
                draft(
                    "R1",
                    1,
                    Decimal::new(1000, 0),
                    RevenueSplitInput::Explicit {
                        licensee_share: Decimal::new(200, 0),
                        hrm8_share: Decimal::new(700, 0),
                    },
                ),
                ts(2026, 2, 1),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::SplitMismatch { .. }));

        let err = l
            .record(
                draft("R1", 1, Decimal::new(-1, 0), RevenueSplitInput::FromLicensee),
                ts(2026, 2, 1),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::NegativeAmount(_)));
    }

    #[test]
    fn test_overlapping_period_rejected() {
        let fx = fixture();
        seed_region(&fx, "R1", None);
        let l = ledger(&fx);
        l.record(
            draft("R1", 1, Decimal::new(10, 0), RevenueSplitInput::FromLicensee),
            ts(2026, 2, 1),
        )
        .unwrap();

        let mut overlapping = draft("R1", 1, Decimal::new(10, 0), RevenueSplitInput::FromLicensee);
        overlapping.period_start = date(2026, 1, 15);
        overlapping.period_end = date(2026, 2, 10);
        assert!(matches!(
            l.record(overlapping, ts(2026, 2, 2)),
            Err(LedgerError::PeriodOverlap { .. })
        ));
    }

    #[test]
    fn test_state_machine_and_edit_lock() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 10, None);
        seed_region(&fx, "R1", Some("L1"));
        let l = ledger(&fx);
        let revenue = l
            .record(
                draft("R1", 1, Decimal::new(1000, 0), RevenueSplitInput::FromLicensee),
                ts(2026, 2, 1),
            )
            .unwrap();

        // 金额变化且未给出分账 -> 按被许可方比例重算
        let updated = l
            .update(
                &revenue.id,
                RevenuePatch {
                    total_revenue: Some(Decimal::new(2000, 0)),
                    ..Default::default()
                },
                ts(2026, 2, 2),
            )
            .unwrap();
        assert_eq!(updated.licensee_share, Decimal::new(20000, 2));

        assert!(matches!(
            l.mark_paid(&revenue.id, "finance", ts(2026, 2, 3)),
            Err(LedgerError::InvalidTransition { .. })
        ));
        l.confirm(&revenue.id, "finance", ts(2026, 2, 4)).unwrap();
        let again = l.confirm(&revenue.id, "finance", ts(2026, 2, 5)).unwrap();
        assert_eq!(again.status, RevenueStatus::Confirmed);

        assert!(matches!(
            l.update(&revenue.id, RevenuePatch::default(), ts(2026, 2, 6)),
            Err(LedgerError::NotEditable { .. })
        ));

        let paid = l.mark_paid(&revenue.id, "finance", ts(2026, 3, 1)).unwrap();
        assert_eq!(paid.paid_at, Some(ts(2026, 3, 1)));
        let noop = l.mark_paid(&revenue.id, "finance", ts(2026, 3, 9)).unwrap();
        assert_eq!(noop.paid_at, Some(ts(2026, 3, 1)));
    }

    #[test]
    fn test_summarize_by_licensee() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 25, None);
        seed_region(&fx, "R1", Some("L1"));
        seed_region(&fx, "R2", None);
        let l = ledger(&fx);
        for month in 1..=3 {
            l.record(
                draft("R1", month, Decimal::new(400, 0), RevenueSplitInput::FromLicensee),
                ts(2026, 4, 1),
            )
            .unwrap();
        }
        l.record(
            draft("R2", 1, Decimal::new(999, 0), RevenueSplitInput::FromLicensee),
            ts(2026, 4, 1),
        )
        .unwrap();

        let summary = l
            .summarize(&RevenueFilter {
                licensee_id: Some("L1".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.total_revenue, Decimal::new(1200, 0));
        assert_eq!(summary.licensee_share, Decimal::new(300, 0));
        assert_eq!(summary.hrm8_share, Decimal::new(900, 0));
    }
}
