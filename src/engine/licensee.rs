// ==========================================
// HRM8 销售引擎 - 区域被许可方状态管理
// ==========================================
// 职责: 被许可方暂停 / 终止 / 恢复
// 状态机: ACTIVE -> SUSPENDED -> ACTIVE
//         ACTIVE | SUSPENDED -> TERMINATED (终态)
// ==========================================

use crate::domain::{entity_types, AuditAction, LicenseeStatus, RegionalLicensee};
use crate::engine::audit::AuditRecorder;
use crate::engine::error::LicenseeError;
use crate::engine::events::{OptionalNotificationPublisher, SalesEvent, SalesEventType};
use crate::engine::repositories::SalesRepositories;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::instrument;

pub struct LicenseeService {
    repos: SalesRepositories,
    audit: AuditRecorder,
    notifier: OptionalNotificationPublisher,
}

impl LicenseeService {
    pub fn new(repos: SalesRepositories, notifier: OptionalNotificationPublisher) -> Self {
        Self {
            audit: AuditRecorder::new(repos.audit.clone()),
            repos,
            notifier,
        }
    }

    pub fn get(&self, licensee_id: &str) -> Result<RegionalLicensee, LicenseeError> {
        self.repos
            .licensees
            .find_by_id(licensee_id)?
            .ok_or_else(|| LicenseeError::NotFound(licensee_id.to_string()))
    }

    #[instrument(skip(self))]
    pub fn suspend(
        &self,
        licensee_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<RegionalLicensee, LicenseeError> {
        self.transition(
            licensee_id,
            &[LicenseeStatus::Active],
            LicenseeStatus::Suspended,
            AuditAction::LicenseeSuspended,
            performed_by,
            now,
        )
    }

    #[instrument(skip(self))]
    pub fn terminate(
        &self,
        licensee_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<RegionalLicensee, LicenseeError> {
        self.transition(
            licensee_id,
            &[LicenseeStatus::Active, LicenseeStatus::Suspended],
            LicenseeStatus::Terminated,
            AuditAction::LicenseeTerminated,
            performed_by,
            now,
        )
    }

    #[instrument(skip(self))]
    pub fn reactivate(
        &self,
        licensee_id: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<RegionalLicensee, LicenseeError> {
        self.transition(
            licensee_id,
            &[LicenseeStatus::Suspended],
            LicenseeStatus::Active,
            AuditAction::LicenseeReactivated,
            performed_by,
            now,
        )
    }

    fn transition(
        &self,
        licensee_id: &str,
        allowed_from: &[LicenseeStatus],
        next: LicenseeStatus,
        action: AuditAction,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<RegionalLicensee, LicenseeError> {
        let mut licensee = self.get(licensee_id)?;
        let from = licensee.status;
        if !allowed_from.contains(&from) {
            return Err(LicenseeError::InvalidTransition {
                licensee_id: licensee_id.to_string(),
                from,
                to: next,
            });
        }
        if !self
            .repos
            .licensees
            .update_status_if(licensee_id, from, next, now)?
        {
            return Err(LicenseeError::ConcurrentUpdate(licensee_id.to_string()));
        }

        self.audit.record_change(
            entity_types::REGIONAL_LICENSEE,
            licensee_id,
            action,
            json!({ "status": from.to_db_str() }),
            json!({ "status": next.to_db_str() }),
            performed_by,
            now,
        );
        self.notifier.notify(
            SalesEvent::new(
                SalesEventType::LicenseeStatusChanged,
                entity_types::REGIONAL_LICENSEE,
                licensee_id,
            )
            .to_recipient(licensee_id)
            .with_payload(json!({ "from": from.to_db_str(), "to": next.to_db_str() })),
        );
        tracing::info!(licensee_id, %from, to = %next, "licensee status changed");

        licensee.status = next;
        licensee.updated_at = now;
        Ok(licensee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{fixture, seed_licensee, ts};

    #[test]
    fn test_suspend_reactivate_terminate() {
        let fx = fixture();
        seed_licensee(&fx, "L1", 15, None);
        let svc = LicenseeService::new(fx.repos.clone(), fx.notifier.clone());

        let suspended = svc.suspend("L1", "admin", ts(2026, 1, 1)).unwrap();
        assert_eq!(suspended.status, LicenseeStatus::Suspended);
        assert!(matches!(
            svc.suspend("L1", "admin", ts(2026, 1, 2)),
            Err(LicenseeError::InvalidTransition { .. })
        ));

        svc.reactivate("L1", "admin", ts(2026, 1, 3)).unwrap();
        svc.terminate("L1", "admin", ts(2026, 1, 4)).unwrap();
        assert_eq!(svc.get("L1").unwrap().status, LicenseeStatus::Terminated);

        let err = svc.reactivate("L1", "admin", ts(2026, 1, 5)).unwrap_err();
        assert!(matches!(
            err,
            LicenseeError::InvalidTransition {
                from: LicenseeStatus::Terminated,
                ..
            }
        ));

        let trail = fx
            .repos
            .audit
            .list_for_entity(entity_types::REGIONAL_LICENSEE, "L1")
            .unwrap();
        assert_eq!(trail.len(), 3);
    }

    #[test]
    fn test_unknown_licensee() {
        let fx = fixture();
        let svc = LicenseeService::new(fx.repos.clone(), fx.notifier.clone());
        assert!(matches!(
            svc.terminate("NOPE", "admin", ts(2026, 1, 1)),
            Err(LicenseeError::NotFound(_))
        ));
    }
}
