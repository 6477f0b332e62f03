// ==========================================
// HRM8 销售引擎 - 审计记录器
// ==========================================
// 职责: 包装 AuditSink, 提供尽力写入
// 红线: 审计写入失败只记录 error 日志, 不回滚已完成的业务变更
// ==========================================

use crate::domain::{AuditAction, AuditEntry};
use crate::repository::AuditSink;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn record(&self, entry: AuditEntry) -> bool {
        match self.sink.append(&entry) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    entity_type = %entry.entity_type,
                    entity_id = %entry.entity_id,
                    action = %entry.action,
                    error = %e,
                    "audit append failed"
                );
                false
            }
        }
    }

    /// 记录一次字段变更
    #[allow(clippy::too_many_arguments)]
    pub fn record_change(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: AuditAction,
        old_value: JsonValue,
        new_value: JsonValue,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> bool {
        self.record(
            AuditEntry::new(entity_type, entity_id, action, performed_by, now)
                .with_change(old_value, new_value),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RepositoryError, RepositoryResult};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        entries: Mutex<Vec<AuditEntry>>,
        fail: bool,
    }

    impl AuditSink for MemorySink {
        fn append(&self, entry: &AuditEntry) -> RepositoryResult<()> {
            if self.fail {
                return Err(RepositoryError::InternalError("disk full".to_string()));
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        fn list_for_entity(
            &self,
            entity_type: &str,
            entity_id: &str,
        ) -> RepositoryResult<Vec<AuditEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_record_change_appends() {
        let sink = Arc::new(MemorySink::default());
        let recorder = AuditRecorder::new(sink.clone());
        assert!(recorder.record_change(
            "COMPANY",
            "C1",
            AuditAction::AssignAgent,
            json!({ "referred_by": null }),
            json!({ "referred_by": "A1" }),
            "admin",
            Utc::now(),
        ));
        let entries = sink.list_for_entity("COMPANY", "C1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "ASSIGN_AGENT");
    }

    #[test]
    fn test_failed_append_is_reported_not_raised() {
        let sink = Arc::new(MemorySink {
            fail: true,
            ..Default::default()
        });
        let recorder = AuditRecorder::new(sink);
        assert!(!recorder.record(AuditEntry::new(
            "COMMISSION",
            "CM1",
            AuditAction::CommissionExpired,
            "system",
            Utc::now()
        )));
    }
}
