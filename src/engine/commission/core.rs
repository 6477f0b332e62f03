use super::{CommissionOutcome, PlacementCommissionRequest, SalesCommissionRequest};
use crate::config::EngineConfigReader;
use crate::domain::{
    entity_types, AuditAction, Commission, CommissionStatus, CommissionStatusUpdate,
    CommissionType, SYSTEM_ACTOR,
};
use crate::engine::audit::AuditRecorder;
use crate::engine::error::CommissionError;
use crate::engine::events::{OptionalNotificationPublisher, SalesEvent, SalesEventType};
use crate::engine::repositories::SalesRepositories;
use crate::engine::sales_core::SalesCore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// CommissionEngine - 佣金引擎
// ==========================================
pub struct CommissionEngine<C>
where
    C: EngineConfigReader,
{
    pub(super) config: Arc<C>,
    pub(super) repos: SalesRepositories,
    pub(super) audit: AuditRecorder,
    pub(super) notifier: OptionalNotificationPublisher,
}

impl<C> CommissionEngine<C>
where
    C: EngineConfigReader,
{
    pub fn new(
        repos: SalesRepositories,
        config: Arc<C>,
        notifier: OptionalNotificationPublisher,
    ) -> Self {
        Self {
            config,
            audit: AuditRecorder::new(repos.audit.clone()),
            repos,
            notifier,
        }
    }

    /// 费率优先级: 显式费率 > 顾问默认费率 > 全局默认费率
    async fn resolve_rate(
        &self,
        consultant_id: &str,
        explicit: Option<Decimal>,
    ) -> Result<Decimal, CommissionError> {
        let rate = match explicit {
            Some(rate) => rate,
            None => {
                let consultant_rate = self
                    .repos
                    .consultants
                    .find_by_id(consultant_id)?
                    .and_then(|c| c.default_commission_rate);
                match consultant_rate {
                    Some(rate) => rate,
                    None => self.config.get_default_commission_rate().await?,
                }
            }
        };
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(CommissionError::InvalidRate(rate));
        }
        Ok(rate)
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_new(
        &self,
        consultant_id: &str,
        job_id: Option<String>,
        region_id: Option<String>,
        subscription_id: Option<String>,
        commission_type: CommissionType,
        amount: Decimal,
        rate: Decimal,
        status: CommissionStatus,
        commission_expiry_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<CommissionOutcome, CommissionError> {
        let commission = Commission {
            id: Uuid::new_v4().to_string(),
            consultant_id: consultant_id.to_string(),
            job_id,
            region_id,
            subscription_id,
            commission_type,
            amount,
            rate,
            status,
            commission_expiry_date,
            notes: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Some(existing) = self.repos.commissions.insert_if_absent(&commission)? {
            tracing::info!(
                existing_id = %existing.id,
                commission_type = %commission_type,
                "commission already exists, skipping"
            );
            return Ok(CommissionOutcome::AlreadyExists(existing));
        }

        self.audit.record_change(
            entity_types::COMMISSION,
            &commission.id,
            AuditAction::CommissionCreated,
            json!(null),
            json!({
                "commission_type": commission_type.to_db_str(),
                "amount": commission.amount.to_string(),
                "rate": commission.rate.to_string(),
                "status": status.to_db_str(),
            }),
            SYSTEM_ACTOR,
            now,
        );
        self.notifier.notify(
            SalesEvent::new(
                SalesEventType::CommissionCreated,
                entity_types::COMMISSION,
                &commission.id,
            )
            .to_recipient(consultant_id)
            .with_payload(json!({ "amount": commission.amount.to_string() })),
        );
        tracing::info!(
            commission_id = %commission.id,
            commission_type = %commission_type,
            amount = %commission.amount,
            "commission created"
        );
        Ok(CommissionOutcome::Created(commission))
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 套餐销售佣金 (支付完成时创建, 直接 CONFIRMED)
    #[instrument(skip(self, request), fields(consultant_id = %request.consultant_id))]
    pub async fn create_sales_commission(
        &self,
        request: SalesCommissionRequest,
        now: DateTime<Utc>,
    ) -> Result<CommissionOutcome, CommissionError> {
        if request.price < Decimal::ZERO {
            return Err(CommissionError::NegativeAmount(request.price));
        }
        let rate = self.resolve_rate(&request.consultant_id, request.rate).await?;
        let amount = SalesCore::commission_amount(request.price, rate);

        self.insert_new(
            &request.consultant_id,
            request.job_id,
            request.region_id,
            request.subscription_id,
            CommissionType::SubscriptionSale,
            amount,
            rate,
            CommissionStatus::Confirmed,
            None,
            now,
        )
    }

    /// 成功入职佣金 (候选人入职时创建, PENDING)
    ///
    /// 只做筛选的套餐 (SELF_MANAGED / SHORTLISTING) 不产生该佣金
    #[instrument(skip(self, request), fields(job_id = %request.job_id))]
    pub async fn create_placement_commission(
        &self,
        request: PlacementCommissionRequest,
        now: DateTime<Utc>,
    ) -> Result<CommissionOutcome, CommissionError> {
        if request.placement_fee < Decimal::ZERO {
            return Err(CommissionError::NegativeAmount(request.placement_fee));
        }
        let job = self
            .repos
            .jobs
            .find_by_id(&request.job_id)?
            .ok_or_else(|| CommissionError::JobNotFound(request.job_id.clone()))?;
        if !job.service_package.includes_recruitment() {
            return Err(CommissionError::PackageExcludesPlacement(
                job.service_package.to_db_str().to_string(),
            ));
        }

        let rate = self.resolve_rate(&request.consultant_id, request.rate).await?;
        let amount = SalesCore::commission_amount(request.placement_fee, rate);

        self.insert_new(
            &request.consultant_id,
            Some(job.id),
            job.region_id,
            None,
            CommissionType::Placement,
            amount,
            rate,
            CommissionStatus::Pending,
            request.commission_expiry_date,
            now,
        )
    }

    // ==========================================
    // 生命周期
    // ==========================================

    fn load(&self, commission_id: &str) -> Result<Commission, CommissionError> {
        self.repos
            .commissions
            .find_by_id(commission_id)?
            .ok_or_else(|| CommissionError::NotFound(commission_id.to_string()))
    }

    /// 条件状态迁移; 已处于目标状态时为无操作
    fn transition(
        &self,
        commission_id: &str,
        expected: CommissionStatus,
        next: CommissionStatus,
        notes: Option<String>,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Commission, CommissionError> {
        let mut commission = self.load(commission_id)?;
        if commission.status == next {
            return Ok(commission);
        }
        if commission.status != expected {
            return Err(CommissionError::InvalidTransition {
                commission_id: commission_id.to_string(),
                from: commission.status,
                to: next,
            });
        }

        let paid_at = (next == CommissionStatus::Paid).then_some(now);
        let applied = self.repos.commissions.update_status_if(&CommissionStatusUpdate {
            commission_id: commission_id.to_string(),
            expected,
            next,
            notes: notes.clone(),
            paid_at,
            updated_at: now,
        })?;
        if !applied {
            let current = self.load(commission_id)?;
            return Err(CommissionError::InvalidTransition {
                commission_id: commission_id.to_string(),
                from: current.status,
                to: next,
            });
        }

        let (action, event_type) = match next {
            CommissionStatus::Confirmed => {
                (AuditAction::CommissionConfirmed, SalesEventType::CommissionConfirmed)
            }
            CommissionStatus::Paid => (AuditAction::CommissionPaid, SalesEventType::CommissionPaid),
            _ => (
                AuditAction::CommissionCancelled,
                SalesEventType::CommissionCancelled,
            ),
        };
        self.audit.record_change(
            entity_types::COMMISSION,
            commission_id,
            action,
            json!({ "status": expected.to_db_str() }),
            json!({ "status": next.to_db_str(), "notes": notes }),
            performed_by,
            now,
        );
        self.notifier.notify(
            SalesEvent::new(event_type, entity_types::COMMISSION, commission_id)
                .to_recipient(commission.consultant_id.clone())
                .with_payload(json!({ "amount": commission.amount.to_string() })),
        );
        tracing::info!(commission_id, from = %expected, to = %next, "commission transitioned");

        commission.status = next;
        if notes.is_some() {
            commission.notes = notes;
        }
        if paid_at.is_some() {
            commission.paid_at = paid_at;
        }
        commission.updated_at = now;
        Ok(commission)
    }

    #[instrument(skip(self))]
    pub fn confirm(
        &self,
        commission_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Commission, CommissionError> {
        self.transition(
            commission_id,
            CommissionStatus::Pending,
            CommissionStatus::Confirmed,
            None,
            performed_by,
            now,
        )
    }

    /// CONFIRMED -> PAID, 记录 paid_at
    #[instrument(skip(self))]
    pub fn mark_paid(
        &self,
        commission_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Commission, CommissionError> {
        self.transition(
            commission_id,
            CommissionStatus::Confirmed,
            CommissionStatus::Paid,
            None,
            performed_by,
            now,
        )
    }

    #[instrument(skip(self))]
    pub fn cancel(
        &self,
        commission_id: &str,
        reason: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Commission, CommissionError> {
        self.transition(
            commission_id,
            CommissionStatus::Pending,
            CommissionStatus::Cancelled,
            Some(format!("cancelled: {}", reason)),
            performed_by,
            now,
        )
    }

    /// 调整金额, 仅 PENDING 可调
    #[instrument(skip(self))]
    pub fn adjust_amount(
        &self,
        commission_id: &str,
        new_amount: Decimal,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Commission, CommissionError> {
        if new_amount < Decimal::ZERO {
            return Err(CommissionError::NegativeAmount(new_amount));
        }
        let mut commission = self.load(commission_id)?;
        if commission.status.amount_frozen() || commission.status == CommissionStatus::Cancelled {
            return Err(CommissionError::AmountFrozen {
                commission_id: commission_id.to_string(),
                status: commission.status,
            });
        }

        let amount = SalesCore::round_money(new_amount);
        if !self.repos.commissions.update_amount_if_pending(
            commission_id,
            amount,
            commission.rate,
            now,
        )? {
            let current = self.load(commission_id)?;
            return Err(CommissionError::AmountFrozen {
                commission_id: commission_id.to_string(),
                status: current.status,
            });
        }

        self.audit.record_change(
            entity_types::COMMISSION,
            commission_id,
            AuditAction::CommissionAdjusted,
            json!({ "amount": commission.amount.to_string() }),
            json!({ "amount": amount.to_string() }),
            performed_by,
            now,
        );
        tracing::info!(commission_id, old = %commission.amount, new = %amount, "commission adjusted");

        commission.amount = amount;
        commission.updated_at = now;
        Ok(commission)
    }
}
