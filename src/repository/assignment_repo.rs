// ==========================================
// HRM8 销售引擎 - 顾问岗位分配关系仓储
// ==========================================
// 红线: 分配关系只做状态切换, 物理删除只有 delete 一个入口
// ==========================================

use crate::domain::{AssignmentSource, AssignmentStatus, ConsultantJobAssignment};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{format_ts, get_enum, get_ts};
use crate::repository::stores::AssignmentStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    assignment_id, consultant_id, job_id, status, assignment_source,
    pipeline_stage, pipeline_progress, assigned_at, updated_at
"#;

pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ConsultantJobAssignment> {
        Ok(ConsultantJobAssignment {
            id: row.get(0)?,
            consultant_id: row.get(1)?,
            job_id: row.get(2)?,
            status: get_enum(row, 3, AssignmentStatus::from_db_str)?,
            assignment_source: get_enum(row, 4, AssignmentSource::from_db_str)?,
            pipeline_stage: row.get(5)?,
            pipeline_progress: row.get(6)?,
            assigned_at: get_ts(row, 7)?,
            updated_at: get_ts(row, 8)?,
        })
    }
}

impl AssignmentStore for AssignmentRepository {
    fn find_active_for_job(
        &self,
        job_id: &str,
    ) -> RepositoryResult<Option<ConsultantJobAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM consultant_job_assignment WHERE job_id = ?1 AND status = 'ACTIVE' \
             ORDER BY assigned_at DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let assignment = conn
            .query_row(&sql, params![job_id], Self::map_row)
            .optional()?;
        Ok(assignment)
    }

    fn upsert_active(&self, assignment: &ConsultantJobAssignment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        // 同一 (consultant_id, job_id) 再次分配时复用原行, 保留 assignment_id
        conn.execute(
            r#"
            INSERT INTO consultant_job_assignment (
                assignment_id, consultant_id, job_id, status, assignment_source,
                pipeline_stage, pipeline_progress, assigned_at, updated_at
            ) VALUES (?1, ?2, ?3, 'ACTIVE', ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(consultant_id, job_id) DO UPDATE SET
                status = 'ACTIVE',
                assignment_source = excluded.assignment_source,
                pipeline_stage = excluded.pipeline_stage,
                pipeline_progress = excluded.pipeline_progress,
                assigned_at = excluded.assigned_at,
                updated_at = excluded.updated_at
            "#,
            params![
                assignment.id,
                assignment.consultant_id,
                assignment.job_id,
                assignment.assignment_source.to_db_str(),
                assignment.pipeline_stage,
                assignment.pipeline_progress.clamp(0, 100),
                format_ts(&assignment.assigned_at),
                format_ts(&assignment.updated_at),
            ],
        )?;
        Ok(())
    }

    fn deactivate(&self, assignment_id: &str, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE consultant_job_assignment SET status = 'INACTIVE', updated_at = ?2 \
             WHERE assignment_id = ?1 AND status = 'ACTIVE'",
            params![assignment_id, format_ts(&now)],
        )?;
        Ok(rows == 1)
    }

    fn list_for_consultant(
        &self,
        consultant_id: &str,
    ) -> RepositoryResult<Vec<ConsultantJobAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM consultant_job_assignment WHERE consultant_id = ?1 ORDER BY assigned_at ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let assignments = stmt
            .query_map(params![consultant_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assignments)
    }

    fn delete(&self, assignment_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM consultant_job_assignment WHERE assignment_id = ?1",
            params![assignment_id],
        )?;
        Ok(rows == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> AssignmentRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::initialize_schema(&conn).unwrap();
        AssignmentRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn make(id: &str, consultant_id: &str, job_id: &str) -> ConsultantJobAssignment {
        let now = Utc::now();
        ConsultantJobAssignment {
            id: id.to_string(),
            consultant_id: consultant_id.to_string(),
            job_id: job_id.to_string(),
            status: AssignmentStatus::Active,
            assignment_source: AssignmentSource::Auto,
            pipeline_stage: None,
            pipeline_progress: 0,
            assigned_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reassign_same_pair_reactivates_row() {
        let repo = setup();
        repo.upsert_active(&make("A1", "CO1", "J1")).unwrap();
        assert!(repo.deactivate("A1", Utc::now()).unwrap());
        assert!(!repo.deactivate("A1", Utc::now()).unwrap());
        assert!(repo.find_active_for_job("J1").unwrap().is_none());

        let mut again = make("A2", "CO1", "J1");
        again.assignment_source = AssignmentSource::Manual;
        repo.upsert_active(&again).unwrap();

        let active = repo.find_active_for_job("J1").unwrap().unwrap();
        assert_eq!(active.id, "A1");
        assert_eq!(active.assignment_source, AssignmentSource::Manual);
        assert_eq!(repo.list_for_consultant("CO1").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_is_explicit() {
        let repo = setup();
        repo.upsert_active(&make("A1", "CO1", "J1")).unwrap();
        assert!(repo.delete("A1").unwrap());
        assert!(!repo.delete("A1").unwrap());
    }
}
