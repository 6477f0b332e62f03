use super::core::AuditLogRepository;
use crate::domain::AuditEntry;
use crate::repository::error::RepositoryResult;
use crate::repository::row_utils::{format_ts, get_opt_json, get_ts};
use chrono::{DateTime, Utc};
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    audit_id, entity_type, entity_id, action,
    old_value, new_value, performed_by, performed_at
"#;

impl AuditLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 某个实体的全部审计条目, 按时间升序
    pub fn find_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM audit_log WHERE entity_type = ?1 AND entity_id = ?2 \
             ORDER BY performed_at ASC, rowid ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![entity_type, entity_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 按动作查询 (例如 COMMISSION_EXPIRED), 最新在前
    pub fn find_by_action(&self, action: &str, limit: usize) -> RepositoryResult<Vec<AuditEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM audit_log WHERE action = ?1 ORDER BY performed_at DESC, rowid DESC LIMIT ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![action, limit as i64], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 时间范围内的条目数量 [start, end)
    pub fn count_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE performed_at >= ?1 AND performed_at < ?2",
            params![format_ts(&start), format_ts(&end)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub(super) fn map_row(&self, row: &Row) -> SqliteResult<AuditEntry> {
        Ok(AuditEntry {
            id: row.get(0)?,
            entity_type: row.get(1)?,
            entity_id: row.get(2)?,
            action: row.get(3)?,
            old_value: get_opt_json(row, 4)?,
            new_value: get_opt_json(row, 5)?,
            performed_by: row.get(6)?,
            performed_at: get_ts(row, 7)?,
        })
    }
}
