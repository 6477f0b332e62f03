// ==========================================
// HRM8 销售引擎 - 支付事件处理
// ==========================================
// 职责: 将"岗位已支付"事件路由到归属锁定与销售佣金创建
//       将"候选人入职"事件路由到入职佣金创建
// 红线: 重复投递必须幂等 (锁定首次生效 + 佣金按岗位去重)
// ==========================================

use crate::config::EngineConfigReader;
use crate::domain::{CandidateHiredEvent, JobPaidEvent, PaymentStatus};
use crate::engine::attribution::AttributionService;
use crate::engine::commission::{
    CommissionEngine, CommissionOutcome, PlacementCommissionRequest, SalesCommissionRequest,
};
use crate::engine::error::{AttributionError, PaymentEventError};
use crate::engine::repositories::SalesRepositories;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// 岗位支付事件处理结果
#[derive(Debug, Clone, Serialize)]
pub struct JobPaidOutcome {
    pub job_id: String,
    /// 公司当前归属顾问; None 表示无人获得归属, 不产生销售佣金
    pub agent_id: Option<String>,
    pub attribution_newly_locked: bool,
    pub commission_id: Option<String>,
    pub commission_created: bool,
}

pub struct PaymentEventHandler<C>
where
    C: EngineConfigReader,
{
    repos: SalesRepositories,
    attribution: Arc<AttributionService<C>>,
    commissions: Arc<CommissionEngine<C>>,
}

impl<C> PaymentEventHandler<C>
where
    C: EngineConfigReader,
{
    pub fn new(
        repos: SalesRepositories,
        attribution: Arc<AttributionService<C>>,
        commissions: Arc<CommissionEngine<C>>,
    ) -> Self {
        Self {
            repos,
            attribution,
            commissions,
        }
    }

    /// 处理岗位支付完成事件
    ///
    /// # 流程
    /// 1) 校验岗位与公司
    /// 2) 岗位支付状态置为 PAID
    /// 3) 公司已有归属顾问时: 锁定归属 + 创建销售佣金 (CONFIRMED)
    ///
    /// 入职佣金不在此处创建
    #[instrument(skip(self, event), fields(job_id = %event.job_id, company_id = %event.company_id))]
    pub async fn handle_job_paid(
        &self,
        event: &JobPaidEvent,
        now: DateTime<Utc>,
    ) -> Result<JobPaidOutcome, PaymentEventError> {
        if event.amount_paid < Decimal::ZERO {
            return Err(PaymentEventError::NegativeAmount(event.amount_paid));
        }
        let job = self
            .repos
            .jobs
            .find_by_id(&event.job_id)?
            .ok_or_else(|| PaymentEventError::JobNotFound(event.job_id.clone()))?;
        if job.company_id != event.company_id {
            return Err(PaymentEventError::CompanyMismatch {
                job_id: event.job_id.clone(),
                claimed: event.company_id.clone(),
                actual: job.company_id,
            });
        }

        if job.payment_status != PaymentStatus::Paid {
            self.repos
                .jobs
                .set_payment_status(&job.id, PaymentStatus::Paid, now)?;
        }

        let company = self
            .repos
            .companies
            .find_by_id(&event.company_id)?
            .ok_or_else(|| AttributionError::CompanyNotFound(event.company_id.clone()))?;
        let agent_id = match company.referred_by {
            Some(agent) => agent,
            None => {
                tracing::info!("company has no attributed agent, no sales commission");
                return Ok(JobPaidOutcome {
                    job_id: job.id,
                    agent_id: None,
                    attribution_newly_locked: false,
                    commission_id: None,
                    commission_created: false,
                });
            }
        };

        let lock = self.attribution.lock_attribution(&company.id, now)?;

        let commission = self
            .commissions
            .create_sales_commission(
                SalesCommissionRequest {
                    consultant_id: agent_id.clone(),
                    job_id: Some(job.id.clone()),
                    region_id: job.region_id.clone(),
                    subscription_id: event.subscription_id.clone(),
                    price: event.amount_paid,
                    rate: None,
                },
                now,
            )
            .await?;

        tracing::info!(
            agent_id = %agent_id,
            newly_locked = lock.newly_locked(),
            commission_created = commission.is_created(),
            "job payment processed"
        );
        Ok(JobPaidOutcome {
            job_id: job.id,
            agent_id: Some(agent_id),
            attribution_newly_locked: lock.newly_locked(),
            commission_created: commission.is_created(),
            commission_id: Some(commission.into_commission().id),
        })
    }

    /// 处理候选人入职事件 -> PENDING 入职佣金
    #[instrument(skip(self, event), fields(job_id = %event.job_id, consultant_id = %event.consultant_id))]
    pub async fn handle_candidate_hired(
        &self,
        event: &CandidateHiredEvent,
        now: DateTime<Utc>,
    ) -> Result<CommissionOutcome, PaymentEventError> {
        let outcome = self
            .commissions
            .create_placement_commission(
                PlacementCommissionRequest {
                    consultant_id: event.consultant_id.clone(),
                    job_id: event.job_id.clone(),
                    placement_fee: event.placement_fee,
                    rate: None,
                    commission_expiry_date: event.commission_expiry_date,
                },
                now,
            )
            .await?;
        Ok(outcome)
    }
}
