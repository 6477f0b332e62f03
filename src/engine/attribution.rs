// ==========================================
// HRM8 销售引擎 - 归属锁定服务
// ==========================================
// 职责: 公司归属 (referred_by) 的分配、锁定、转移、解锁
// 红线: 锁定期内只允许原归属顾问; 锁字段两者同时设置/清除
// 红线: 只修改 Company, 不触碰佣金与分账
// ==========================================
// 并发: 所有写入均为归属三元组的比较并交换 (单条条件 UPDATE)
// ==========================================

use crate::config::EngineConfigReader;
use crate::domain::{
    entity_types, AttributionState, AuditAction, Company, SYSTEM_ACTOR,
};
use crate::engine::audit::AuditRecorder;
use crate::engine::error::AttributionError;
use crate::engine::events::{OptionalNotificationPublisher, SalesEvent, SalesEventType};
use crate::engine::repositories::SalesRepositories;
use crate::engine::sales_core::SalesCore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::instrument;

/// 比较并交换失败后的最大重读次数
const MAX_CAS_ATTEMPTS: usize = 3;

/// 锁定操作结果
#[derive(Debug, Clone, PartialEq)]
pub enum LockOutcome {
    /// 本次调用建立了锁
    Locked(Company),
    /// 锁已处于保护期内, 未做任何修改
    AlreadyLocked(Company),
}

impl LockOutcome {
    pub fn company(&self) -> &Company {
        match self {
            LockOutcome::Locked(c) | LockOutcome::AlreadyLocked(c) => c,
        }
    }

    pub fn newly_locked(&self) -> bool {
        matches!(self, LockOutcome::Locked(_))
    }
}

/// 即将到期的归属锁 (续约跟进)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalOpportunity {
    pub company_id: String,
    pub company_name: String,
    pub agent_id: String,
    pub locked_until: DateTime<Utc>,
    pub days_remaining: i64,
}

// ==========================================
// AttributionService
// ==========================================
pub struct AttributionService<C>
where
    C: EngineConfigReader,
{
    config: Arc<C>,
    repos: SalesRepositories,
    audit: AuditRecorder,
    notifier: OptionalNotificationPublisher,
}

impl<C> AttributionService<C>
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

    fn load(&self, company_id: &str) -> Result<Company, AttributionError> {
        self.repos
            .companies
            .find_by_id(company_id)?
            .ok_or_else(|| AttributionError::CompanyNotFound(company_id.to_string()))
    }

    // ==========================================
    // 纯判定
    // ==========================================

    /// 锁是否仍在 12 个月保护期内
    pub fn is_locked(&self, company: &Company, now: DateTime<Utc>) -> bool {
        SalesCore::is_lock_active(
            company.attribution_locked,
            company.attribution_locked_at,
            now,
        )
    }

    /// 锁到期时刻; 未锁定时为 None
    pub fn locked_until(&self, company: &Company) -> Option<DateTime<Utc>> {
        match (company.attribution_locked, company.attribution_locked_at) {
            (true, Some(locked_at)) => Some(SalesCore::lock_expires_at(locked_at)),
            _ => None,
        }
    }

    /// agent_id 是否为该公司的有效归属顾问
    pub fn has_valid_attribution(
        &self,
        company_id: &str,
        agent_id: &str,
        _now: DateTime<Utc>,
    ) -> Result<bool, AttributionError> {
        let company = self.load(company_id)?;
        // 归属方本人永远不会被自己的锁阻挡; 其他顾问即使锁已过期也不是归属方
        Ok(company.referred_by.as_deref() == Some(agent_id))
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 分配归属顾问
    ///
    /// # 规则
    /// - 锁定期内且归属方不同 -> Locked
    /// - 锁定期内且归属方相同 -> 无操作
    /// - 其余情况只改 referred_by, 不改锁字段
    #[instrument(skip(self), fields(company_id = %company_id, agent_id = %agent_id))]
    pub fn assign_agent(
        &self,
        company_id: &str,
        agent_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Company, AttributionError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut company = self.load(company_id)?;

            if self.is_locked(&company, now) {
                let owner = company.referred_by.clone().unwrap_or_default();
                if owner != agent_id {
                    let locked_until = self.locked_until(&company).unwrap_or(now);
                    tracing::debug!(owner = %owner, %locked_until, "assign rejected by active lock");
                    return Err(AttributionError::Locked {
                        company_id: company_id.to_string(),
                        owner,
                        locked_until,
                    });
                }
                return Ok(company);
            }

            if company.referred_by.as_deref() == Some(agent_id) {
                return Ok(company);
            }

            let expected = company.attribution_state();
            let next = expected.with_referrer(agent_id);
            if self
                .repos
                .companies
                .compare_and_set_attribution(company_id, &expected, &next, now)?
            {
                self.audit.record_change(
                    entity_types::COMPANY,
                    company_id,
                    AuditAction::AssignAgent,
                    state_json(&expected),
                    state_json(&next),
                    SYSTEM_ACTOR,
                    now,
                );
                tracing::info!(previous = ?expected.referred_by, "agent assigned");
                company.referred_by = next.referred_by;
                company.updated_at = now;
                return Ok(company);
            }
            tracing::debug!("attribution changed concurrently, re-reading");
        }
        Err(AttributionError::ConcurrentUpdate(company_id.to_string()))
    }

    /// 锁定当前归属 (首次锁定生效)
    ///
    /// # 规则
    /// - referred_by 为空 -> NoAttributionAssigned
    /// - 保护期内重复调用 -> AlreadyLocked, 不改时间戳
    /// - 已过期的锁可以重新锁定
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub fn lock_attribution(
        &self,
        company_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LockOutcome, AttributionError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut company = self.load(company_id)?;

            let agent_id = match &company.referred_by {
                Some(agent) => agent.clone(),
                None => return Err(AttributionError::NoAttributionAssigned(company_id.to_string())),
            };

            if self.is_locked(&company, now) {
                return Ok(LockOutcome::AlreadyLocked(company));
            }

            let expected = company.attribution_state();
            let next = expected.locked_at(now);
            if self
                .repos
                .companies
                .compare_and_set_attribution(company_id, &expected, &next, now)?
            {
                self.audit.record_change(
                    entity_types::COMPANY,
                    company_id,
                    AuditAction::LockAttribution,
                    state_json(&expected),
                    state_json(&next),
                    SYSTEM_ACTOR,
                    now,
                );
                self.notifier.notify(
                    SalesEvent::new(
                        SalesEventType::AttributionLocked,
                        entity_types::COMPANY,
                        company_id,
                    )
                    .to_recipient(agent_id.clone())
                    .with_payload(json!({
                        "locked_until": SalesCore::lock_expires_at(now),
                    })),
                );
                tracing::info!(agent_id = %agent_id, "attribution locked");
                company.attribution_locked = true;
                company.attribution_locked_at = Some(now);
                company.updated_at = now;
                return Ok(LockOutcome::Locked(company));
            }
            tracing::debug!("attribution changed concurrently, re-reading");
        }
        Err(AttributionError::ConcurrentUpdate(company_id.to_string()))
    }

    /// 管理员转移归属: 改为新顾问并开始新的锁定期
    #[instrument(skip(self), fields(company_id = %company_id, new_agent_id = %new_agent_id))]
    pub fn transfer_attribution(
        &self,
        company_id: &str,
        new_agent_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Company, AttributionError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut company = self.load(company_id)?;
            let expected = company.attribution_state();
            let next = AttributionState {
                referred_by: Some(new_agent_id.to_string()),
                attribution_locked: true,
                attribution_locked_at: Some(now),
            };

            if self
                .repos
                .companies
                .compare_and_set_attribution(company_id, &expected, &next, now)?
            {
                self.audit.record_change(
                    entity_types::COMPANY,
                    company_id,
                    AuditAction::TransferAttribution,
                    state_json(&expected),
                    state_json(&next),
                    performed_by,
                    now,
                );
                self.notifier.notify(
                    SalesEvent::new(
                        SalesEventType::AttributionTransferred,
                        entity_types::COMPANY,
                        company_id,
                    )
                    .to_recipient(new_agent_id)
                    .with_payload(json!({
                        "previous_agent": expected.referred_by,
                        "performed_by": performed_by,
                    })),
                );
                tracing::info!(previous = ?expected.referred_by, performed_by, "attribution transferred");
                company.referred_by = next.referred_by;
                company.attribution_locked = true;
                company.attribution_locked_at = Some(now);
                company.updated_at = now;
                return Ok(company);
            }
        }
        Err(AttributionError::ConcurrentUpdate(company_id.to_string()))
    }

    /// 管理员解锁: 同时清除锁标志与锁定时间, 保留 referred_by
    #[instrument(skip(self), fields(company_id = %company_id))]
    pub fn unlock_attribution(
        &self,
        company_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Company, AttributionError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut company = self.load(company_id)?;
            if !company.attribution_locked {
                return Ok(company);
            }

            let expected = company.attribution_state();
            let next = expected.unlocked();
            if self
                .repos
                .companies
                .compare_and_set_attribution(company_id, &expected, &next, now)?
            {
                self.audit.record_change(
                    entity_types::COMPANY,
                    company_id,
                    AuditAction::UnlockAttribution,
                    state_json(&expected),
                    state_json(&next),
                    performed_by,
                    now,
                );
                tracing::info!(performed_by, "attribution unlocked");
                company.attribution_locked = false;
                company.attribution_locked_at = None;
                company.updated_at = now;
                return Ok(company);
            }
        }
        Err(AttributionError::ConcurrentUpdate(company_id.to_string()))
    }

    /// 查找 window_days 天内到期的有效锁, 并通知归属顾问
    ///
    /// window_days 为 None 时读取配置 renewal_window_days
    #[instrument(skip(self))]
    pub async fn find_renewal_opportunities(
        &self,
        window_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RenewalOpportunity>, AttributionError> {
        let window_days = match window_days {
            Some(days) => days.max(0),
            None => self.config.get_renewal_window_days().await?,
        };
        let horizon = SalesCore::shift_days(now, window_days)
            .ok_or(AttributionError::WindowOutOfRange(window_days))?;

        let mut opportunities = Vec::new();
        for company in self.repos.companies.list_locked()? {
            if !self.is_locked(&company, now) {
                continue;
            }
            let (Some(locked_until), Some(agent_id)) =
                (self.locked_until(&company), company.referred_by.clone())
            else {
                continue;
            };
            if locked_until > horizon {
                continue;
            }

            let opportunity = RenewalOpportunity {
                company_id: company.id.clone(),
                company_name: company.name.clone(),
                agent_id,
                locked_until,
                days_remaining: (locked_until - now).num_days(),
            };
            self.notifier.notify(
                SalesEvent::new(
                    SalesEventType::RenewalOpportunity,
                    entity_types::COMPANY,
                    &company.id,
                )
                .to_recipient(opportunity.agent_id.clone())
                .with_payload(json!({
                    "locked_until": opportunity.locked_until,
                    "days_remaining": opportunity.days_remaining,
                })),
            );
            opportunities.push(opportunity);
        }

        tracing::info!(count = opportunities.len(), window_days, "renewal opportunities found");
        Ok(opportunities)
    }
}

fn state_json(state: &AttributionState) -> JsonValue {
    json!({
        "referred_by": state.referred_by,
        "attribution_locked": state.attribution_locked,
        "attribution_locked_at": state.attribution_locked_at,
    })
}
