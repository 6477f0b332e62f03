// ==========================================
// HRM8 销售引擎 - 佣金数据仓储
// ==========================================
// 红线: 状态迁移一律带 WHERE status = expected, 保证并发下只有一个写入方成功
// 红线: 同一岗位同一类型最多一条未取消佣金 (支付回调可能重复投递)
// ==========================================

use crate::domain::{Commission, CommissionStatus, CommissionStatusUpdate, CommissionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    format_opt_ts, format_ts, get_decimal, get_enum, get_opt_ts, get_ts,
};
use crate::repository::stores::CommissionStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    commission_id, consultant_id, job_id, region_id, subscription_id,
    commission_type, amount, rate, status, commission_expiry_date,
    notes, paid_at, created_at, updated_at
"#;

// ==========================================
// CommissionRepository - 佣金仓储
// ==========================================
pub struct CommissionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CommissionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Commission> {
        Ok(Commission {
            id: row.get(0)?,
            consultant_id: row.get(1)?,
            job_id: row.get(2)?,
            region_id: row.get(3)?,
            subscription_id: row.get(4)?,
            commission_type: get_enum(row, 5, CommissionType::from_db_str)?,
            amount: get_decimal(row, 6)?,
            rate: get_decimal(row, 7)?,
            status: get_enum(row, 8, CommissionStatus::from_db_str)?,
            commission_expiry_date: get_opt_ts(row, 9)?,
            notes: row.get(10)?,
            paid_at: get_opt_ts(row, 11)?,
            created_at: get_ts(row, 12)?,
            updated_at: get_ts(row, 13)?,
        })
    }

    fn query_list(
        &self,
        where_clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<Commission>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM commission WHERE {} ORDER BY created_at ASC, commission_id ASC",
            SELECT_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let commissions = stmt
            .query_map(params, Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(commissions)
    }
}

impl CommissionStore for CommissionRepository {
    fn find_by_id(&self, commission_id: &str) -> RepositoryResult<Option<Commission>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM commission WHERE commission_id = ?1",
            SELECT_COLUMNS
        );
        let commission = conn
            .query_row(&sql, params![commission_id], Self::map_row)
            .optional()?;
        Ok(commission)
    }

    fn insert_if_absent(&self, commission: &Commission) -> RepositoryResult<Option<Commission>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if let Some(job_id) = &commission.job_id {
            let sql = format!(
                "SELECT {} FROM commission \
                 WHERE job_id = ?1 AND commission_type = ?2 AND status <> 'CANCELLED' \
                 ORDER BY created_at ASC LIMIT 1",
                SELECT_COLUMNS
            );
            let existing = tx
                .query_row(
                    &sql,
                    params![job_id, commission.commission_type.to_db_str()],
                    Self::map_row,
                )
                .optional()?;
            if existing.is_some() {
                return Ok(existing);
            }
        }

        tx.execute(
            r#"
            INSERT INTO commission (
                commission_id, consultant_id, job_id, region_id, subscription_id,
                commission_type, amount, rate, status, commission_expiry_date,
                notes, paid_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                commission.id,
                commission.consultant_id,
                commission.job_id,
                commission.region_id,
                commission.subscription_id,
                commission.commission_type.to_db_str(),
                commission.amount.to_string(),
                commission.rate.to_string(),
                commission.status.to_db_str(),
                format_opt_ts(&commission.commission_expiry_date),
                commission.notes,
                format_opt_ts(&commission.paid_at),
                format_ts(&commission.created_at),
                format_ts(&commission.updated_at),
            ],
        )?;
        tx.commit()?;
        Ok(None)
    }

    fn update_status_if(&self, update: &CommissionStatusUpdate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE commission
            SET status = ?3,
                notes = COALESCE(?4, notes),
                paid_at = COALESCE(?5, paid_at),
                updated_at = ?6
            WHERE commission_id = ?1 AND status = ?2
            "#,
            params![
                update.commission_id,
                update.expected.to_db_str(),
                update.next.to_db_str(),
                update.notes,
                format_opt_ts(&update.paid_at),
                format_ts(&update.updated_at),
            ],
        )?;
        Ok(rows == 1)
    }

    fn update_amount_if_pending(
        &self,
        commission_id: &str,
        amount: Decimal,
        rate: Decimal,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE commission SET amount = ?2, rate = ?3, updated_at = ?4 \
             WHERE commission_id = ?1 AND status = 'PENDING'",
            params![
                commission_id,
                amount.to_string(),
                rate.to_string(),
                format_ts(&now)
            ],
        )?;
        Ok(rows == 1)
    }

    fn list_pending_by_type(
        &self,
        commission_type: CommissionType,
    ) -> RepositoryResult<Vec<Commission>> {
        self.query_list(
            "status = 'PENDING' AND commission_type = ?1",
            &[&commission_type.to_db_str()],
        )
    }

    fn list_pending_with_expiry_before(
        &self,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Commission>> {
        let cutoff = format_ts(&now);
        self.query_list(
            "status = 'PENDING' AND commission_expiry_date IS NOT NULL AND commission_expiry_date < ?1",
            &[&cutoff],
        )
    }

    fn count_created_since(
        &self,
        region_id: &str,
        commission_type: CommissionType,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM commission \
             WHERE region_id = ?1 AND commission_type = ?2 AND created_at >= ?3",
            params![region_id, commission_type.to_db_str(), format_ts(&since)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_by_consultant(&self, consultant_id: &str) -> RepositoryResult<Vec<Commission>> {
        self.query_list("consultant_id = ?1", &[&consultant_id])
    }
}
