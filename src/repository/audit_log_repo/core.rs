use crate::domain::AuditEntry;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::format_ts;
use crate::repository::stores::AuditSink;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑, 只做数据映射
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入审计条目
    ///
    /// # 返回
    /// - `Ok(audit_id)`: 成功插入
    /// - `Err(...)`: 数据库错误 (包括 audit_id 重复)
    pub fn insert(&self, entry: &AuditEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (
                audit_id, entity_type, entity_id, action,
                old_value, new_value, performed_by, performed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.id,
                entry.entity_type,
                entry.entity_id,
                entry.action,
                entry.old_value.as_ref().map(|v| v.to_string()),
                entry.new_value.as_ref().map(|v| v.to_string()),
                entry.performed_by,
                format_ts(&entry.performed_at),
            ],
        )?;

        Ok(entry.id.clone())
    }
}

impl AuditSink for AuditLogRepository {
    fn append(&self, entry: &AuditEntry) -> RepositoryResult<()> {
        self.insert(entry).map(|_| ())
    }

    fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Vec<AuditEntry>> {
        self.find_by_entity(entity_type, entity_id)
    }
}
