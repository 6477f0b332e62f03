// ==========================================
// HRM8 销售引擎 - 被许可方结算单仓储
// ==========================================
// 说明: 结算单由结算模块生成, 本引擎只读取 PENDING 记录做合规检测
// ==========================================

use crate::domain::{Settlement, SettlementStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    format_date, format_opt_ts, format_ts, get_date, get_decimal, get_enum, get_opt_ts, get_ts,
};
use crate::repository::stores::SettlementStore;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct SettlementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettlementRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl SettlementStore for SettlementRepository {
    fn insert(&self, settlement: &Settlement) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO settlement (
                settlement_id, licensee_id, period_start, period_end,
                total_amount, status, generated_at, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                settlement.id,
                settlement.licensee_id,
                format_date(&settlement.period_start),
                format_date(&settlement.period_end),
                settlement.total_amount.to_string(),
                settlement.status.to_db_str(),
                format_ts(&settlement.generated_at),
                format_opt_ts(&settlement.paid_at),
            ],
        )?;
        Ok(())
    }

    fn list_pending(&self) -> RepositoryResult<Vec<Settlement>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT settlement_id, licensee_id, period_start, period_end,
                   total_amount, status, generated_at, paid_at
            FROM settlement
            WHERE status = 'PENDING'
            ORDER BY generated_at ASC, settlement_id ASC
            "#,
        )?;
        let settlements = stmt
            .query_map([], |row| {
                Ok(Settlement {
                    id: row.get(0)?,
                    licensee_id: row.get(1)?,
                    period_start: get_date(row, 2)?,
                    period_end: get_date(row, 3)?,
                    total_amount: get_decimal(row, 4)?,
                    status: get_enum(row, 5, SettlementStatus::from_db_str)?,
                    generated_at: get_ts(row, 6)?,
                    paid_at: get_opt_ts(row, 7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(settlements)
    }
}
