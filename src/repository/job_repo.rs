// ==========================================
// HRM8 销售引擎 - 岗位数据仓储
// ==========================================
// 说明: 岗位生命周期归外部服务, 这里只读取并回写分配/付款字段
// ==========================================

use crate::domain::{Job, PaymentStatus, ServicePackage};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{format_ts, get_enum, get_ts};
use crate::repository::stores::JobStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    job_id, company_id, title, region_id, category, assigned_consultant_id,
    service_package, payment_status, created_at, updated_at
"#;

pub struct JobRepository {
    conn: Arc<Mutex<Connection>>,
}

impl JobRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Job> {
        Ok(Job {
            id: row.get(0)?,
            company_id: row.get(1)?,
            title: row.get(2)?,
            region_id: row.get(3)?,
            category: row.get(4)?,
            assigned_consultant_id: row.get(5)?,
            service_package: get_enum(row, 6, ServicePackage::from_db_str)?,
            payment_status: get_enum(row, 7, PaymentStatus::from_db_str)?,
            created_at: get_ts(row, 8)?,
            updated_at: get_ts(row, 9)?,
        })
    }
}

impl JobStore for JobRepository {
    fn find_by_id(&self, job_id: &str) -> RepositoryResult<Option<Job>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM job WHERE job_id = ?1", SELECT_COLUMNS);
        let job = conn.query_row(&sql, params![job_id], Self::map_row).optional()?;
        Ok(job)
    }

    fn insert(&self, job: &Job) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO job (
                job_id, company_id, title, region_id, category, assigned_consultant_id,
                service_package, payment_status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                job.id,
                job.company_id,
                job.title,
                job.region_id,
                job.category,
                job.assigned_consultant_id,
                job.service_package.to_db_str(),
                job.payment_status.to_db_str(),
                format_ts(&job.created_at),
                format_ts(&job.updated_at),
            ],
        )?;
        Ok(())
    }

    fn compare_and_set_assignee(
        &self,
        job_id: &str,
        expected: Option<&str>,
        next: Option<&str>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE job SET assigned_consultant_id = ?3, updated_at = ?4 \
             WHERE job_id = ?1 AND assigned_consultant_id IS ?2",
            params![job_id, expected, next, format_ts(&now)],
        )?;
        Ok(rows == 1)
    }

    fn set_payment_status(
        &self,
        job_id: &str,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE job SET payment_status = ?2, updated_at = ?3 WHERE job_id = ?1",
            params![job_id, status.to_db_str(), format_ts(&now)],
        )?;
        Ok(rows == 1)
    }
}
