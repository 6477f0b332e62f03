use super::CommissionEngine;
use crate::config::EngineConfigReader;
use crate::domain::{
    entity_types, AuditAction, Commission, CommissionStatus, CommissionStatusUpdate,
    CommissionType, SYSTEM_ACTOR,
};
use crate::engine::events::{SalesEvent, SalesEventType};
use crate::engine::sales_core::{SalesCore, SALES_COMMISSION_EXPIRY_MONTHS};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

// ==========================================
// 清扫结果
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SweepErrorCategory {
    /// 候选记录查询失败
    Query,
    /// 关联订阅读取失败或缺失
    SubscriptionLookup,
    /// 状态迁移写入失败
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepError {
    pub commission_id: Option<String>,
    pub category: SweepErrorCategory,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpirySweepResult {
    /// 因满 12 个月被取消的套餐销售佣金
    pub age_expired: usize,
    /// 因 commission_expiry_date 已过被取消的佣金
    pub explicit_expired: usize,
    pub errors: Vec<SweepError>,
}

impl ExpirySweepResult {
    pub fn total_expired(&self) -> usize {
        self.age_expired + self.explicit_expired
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// 套餐销售佣金是否按年龄过期
///
/// 佣金本身与关联订阅的开始日期都必须满 12 个月; 无关联订阅时只看佣金自身
pub(crate) fn is_age_expired(
    commission: &Commission,
    subscription_start: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> bool {
    if !SalesCore::has_aged_past(commission.created_at, SALES_COMMISSION_EXPIRY_MONTHS, now) {
        return false;
    }
    match subscription_start {
        Some(start) => SalesCore::date_has_aged_past(start, SALES_COMMISSION_EXPIRY_MONTHS, now),
        None => true,
    }
}

impl<C> CommissionEngine<C>
where
    C: EngineConfigReader,
{
    /// 佣金过期清扫 (幂等)
    ///
    /// # 流程
    /// 1) PENDING 且 commission_expiry_date < now -> CANCELLED
    /// 2) PENDING 的 SUBSCRIPTION_SALE, 佣金与订阅均满 12 个月 -> CANCELLED
    ///
    /// 单条失败记入 errors, 不中断批次; 无匹配不算错误
    #[instrument(skip(self))]
    pub fn run_expiry_sweep(&self, now: DateTime<Utc>) -> ExpirySweepResult {
        let mut result = ExpirySweepResult::default();

        // === 步骤 1: 显式过期日 ===
        match self.repos.commissions.list_pending_with_expiry_before(now) {
            Ok(candidates) => {
                for commission in candidates {
                    let note = format!(
                        "expired: commission_expiry_date {} passed",
                        commission
                            .commission_expiry_date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_default()
                    );
                    if self.expire_one(&commission, note, now, &mut result.errors) {
                        result.explicit_expired += 1;
                    }
                }
            }
            Err(e) => result.errors.push(SweepError {
                commission_id: None,
                category: SweepErrorCategory::Query,
                message: format!("listing commissions with expiry date failed: {}", e),
            }),
        }

        // === 步骤 2: 套餐销售佣金 12 个月窗口 ===
        match self
            .repos
            .commissions
            .list_pending_by_type(CommissionType::SubscriptionSale)
        {
            Ok(candidates) => {
                for commission in candidates {
                    let subscription_start = match &commission.subscription_id {
                        None => None,
                        Some(subscription_id) => {
                            match self.repos.subscriptions.find_by_id(subscription_id) {
                                Ok(Some(subscription)) => Some(subscription.start_date),
                                Ok(None) => {
                                    result.errors.push(SweepError {
                                        commission_id: Some(commission.id.clone()),
                                        category: SweepErrorCategory::SubscriptionLookup,
                                        message: format!(
                                            "subscription {} not found",
                                            subscription_id
                                        ),
                                    });
                                    continue;
                                }
                                Err(e) => {
                                    result.errors.push(SweepError {
                                        commission_id: Some(commission.id.clone()),
                                        category: SweepErrorCategory::SubscriptionLookup,
                                        message: e.to_string(),
                                    });
                                    continue;
                                }
                            }
                        }
                    };

                    if !is_age_expired(&commission, subscription_start, now) {
                        continue;
                    }
                    let note = match subscription_start {
                        Some(start) => format!(
                            "expired: 12 months since subscription start {}",
                            start.format("%Y-%m-%d")
                        ),
                        None => "expired: 12 months since commission creation".to_string(),
                    };
                    if self.expire_one(&commission, note, now, &mut result.errors) {
                        result.age_expired += 1;
                    }
                }
            }
            Err(e) => result.errors.push(SweepError {
                commission_id: None,
                category: SweepErrorCategory::Query,
                message: format!("listing pending sales commissions failed: {}", e),
            }),
        }

        tracing::info!(
            age_expired = result.age_expired,
            explicit_expired = result.explicit_expired,
            errors = result.errors.len(),
            "commission expiry sweep finished"
        );
        result
    }

    /// PENDING -> CANCELLED; 已被其他进程处理时返回 false 且不算错误
    fn expire_one(
        &self,
        commission: &Commission,
        note: String,
        now: DateTime<Utc>,
        errors: &mut Vec<SweepError>,
    ) -> bool {
        let update = CommissionStatusUpdate {
            commission_id: commission.id.clone(),
            expected: CommissionStatus::Pending,
            next: CommissionStatus::Cancelled,
            notes: Some(note.clone()),
            paid_at: None,
            updated_at: now,
        };
        match self.repos.commissions.update_status_if(&update) {
            Ok(true) => {
                self.audit.record_change(
                    entity_types::COMMISSION,
                    &commission.id,
                    AuditAction::CommissionExpired,
                    json!({ "status": CommissionStatus::Pending.to_db_str() }),
                    json!({ "status": CommissionStatus::Cancelled.to_db_str(), "notes": note }),
                    SYSTEM_ACTOR,
                    now,
                );
                self.notifier.notify(
                    SalesEvent::new(
                        SalesEventType::CommissionExpired,
                        entity_types::COMMISSION,
                        &commission.id,
                    )
                    .to_recipient(commission.consultant_id.clone())
                    .with_payload(json!({ "notes": note })),
                );
                tracing::debug!(commission_id = %commission.id, "commission expired");
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!(commission_id = %commission.id, error = %e, "expiry update failed");
                errors.push(SweepError {
                    commission_id: Some(commission.id.clone()),
                    category: SweepErrorCategory::Update,
                    message: e.to_string(),
                });
                false
            }
        }
    }
}
