// ==========================================
// HRM8 销售引擎 - 区域分账数据仓储
// ==========================================
// 红线: 同一区域核算期间不重叠 (检查与写入在同一事务内)
// 红线: 仓储不计算分账, 只保存引擎给出的份额
// ==========================================

use crate::domain::{RegionalRevenue, RevenueFilter, RevenueStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    format_date, format_opt_ts, format_ts, get_date, get_decimal, get_enum, get_opt_ts, get_ts,
};
use crate::repository::stores::{RevenueStore, RevenueWriteOutcome};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    revenue_id, region_id, licensee_id, period_start, period_end,
    total_revenue, licensee_share, hrm8_share, status, paid_at,
    created_at, updated_at
"#;

// ==========================================
// RevenueRepository - 区域分账仓储
// ==========================================
pub struct RevenueRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RevenueRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RegionalRevenue> {
        Ok(RegionalRevenue {
            id: row.get(0)?,
            region_id: row.get(1)?,
            licensee_id: row.get(2)?,
            period_start: get_date(row, 3)?,
            period_end: get_date(row, 4)?,
            total_revenue: get_decimal(row, 5)?,
            licensee_share: get_decimal(row, 6)?,
            hrm8_share: get_decimal(row, 7)?,
            status: get_enum(row, 8, RevenueStatus::from_db_str)?,
            paid_at: get_opt_ts(row, 9)?,
            created_at: get_ts(row, 10)?,
            updated_at: get_ts(row, 11)?,
        })
    }

    /// 同区域内与 revenue 期间重叠的其他记录 (闭区间)
    fn find_overlap(tx: &Transaction<'_>, revenue: &RegionalRevenue) -> RepositoryResult<Option<String>> {
        let conflicting = tx
            .query_row(
                "SELECT revenue_id FROM regional_revenue \
                 WHERE region_id = ?1 AND revenue_id <> ?2 \
                   AND period_start <= ?4 AND ?3 <= period_end \
                 ORDER BY period_start ASC LIMIT 1",
                params![
                    revenue.region_id,
                    revenue.id,
                    format_date(&revenue.period_start),
                    format_date(&revenue.period_end),
                ],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(conflicting)
    }
}

impl RevenueStore for RevenueRepository {
    fn find_by_id(&self, revenue_id: &str) -> RepositoryResult<Option<RegionalRevenue>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM regional_revenue WHERE revenue_id = ?1",
            SELECT_COLUMNS
        );
        let revenue = conn
            .query_row(&sql, params![revenue_id], Self::map_row)
            .optional()?;
        Ok(revenue)
    }

    fn insert_checked(&self, revenue: &RegionalRevenue) -> RepositoryResult<RevenueWriteOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if let Some(conflicting_id) = Self::find_overlap(&tx, revenue)? {
            return Ok(RevenueWriteOutcome::Overlap { conflicting_id });
        }

        tx.execute(
            r#"
            INSERT INTO regional_revenue (
                revenue_id, region_id, licensee_id, period_start, period_end,
                total_revenue, licensee_share, hrm8_share, status, paid_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                revenue.id,
                revenue.region_id,
                revenue.licensee_id,
                format_date(&revenue.period_start),
                format_date(&revenue.period_end),
                revenue.total_revenue.to_string(),
                revenue.licensee_share.to_string(),
                revenue.hrm8_share.to_string(),
                revenue.status.to_db_str(),
                format_opt_ts(&revenue.paid_at),
                format_ts(&revenue.created_at),
                format_ts(&revenue.updated_at),
            ],
        )?;
        tx.commit()?;
        Ok(RevenueWriteOutcome::Written)
    }

    fn update_checked(&self, revenue: &RegionalRevenue) -> RepositoryResult<RevenueWriteOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM regional_revenue WHERE revenue_id = ?1",
                params![revenue.id],
                |row| row.get(0),
            )
            .optional()?;
        match status.as_deref().and_then(RevenueStatus::from_db_str) {
            None => return Ok(RevenueWriteOutcome::NotFound),
            Some(RevenueStatus::Pending) => {}
            Some(_) => return Ok(RevenueWriteOutcome::NotPending),
        }

        if let Some(conflicting_id) = Self::find_overlap(&tx, revenue)? {
            return Ok(RevenueWriteOutcome::Overlap { conflicting_id });
        }

        tx.execute(
            r#"
            UPDATE regional_revenue
            SET period_start = ?2, period_end = ?3,
                total_revenue = ?4, licensee_share = ?5, hrm8_share = ?6,
                licensee_id = ?7, updated_at = ?8
            WHERE revenue_id = ?1 AND status = 'PENDING'
            "#,
            params![
                revenue.id,
                format_date(&revenue.period_start),
                format_date(&revenue.period_end),
                revenue.total_revenue.to_string(),
                revenue.licensee_share.to_string(),
                revenue.hrm8_share.to_string(),
                revenue.licensee_id,
                format_ts(&revenue.updated_at),
            ],
        )?;
        tx.commit()?;
        Ok(RevenueWriteOutcome::Written)
    }

    fn update_status_if(
        &self,
        revenue_id: &str,
        expected: RevenueStatus,
        next: RevenueStatus,
        paid_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE regional_revenue SET status = ?3, paid_at = COALESCE(?4, paid_at), updated_at = ?5 \
             WHERE revenue_id = ?1 AND status = ?2",
            params![
                revenue_id,
                expected.to_db_str(),
                next.to_db_str(),
                format_opt_ts(&paid_at),
                format_ts(&now),
            ],
        )?;
        Ok(rows == 1)
    }

    fn query(&self, filter: &RevenueFilter) -> RepositoryResult<Vec<RegionalRevenue>> {
        let conn = self.get_conn()?;
        let mut sql = format!("SELECT {} FROM regional_revenue WHERE 1 = 1", SELECT_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(region_id) = &filter.region_id {
            sql.push_str(" AND region_id = ?");
            values.push(Value::from(region_id.clone()));
        }
        if let Some(licensee_id) = &filter.licensee_id {
            sql.push_str(" AND licensee_id = ?");
            values.push(Value::from(licensee_id.clone()));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(Value::from(status.to_db_str().to_string()));
        }
        if let Some((start, end)) = filter.overlaps {
            sql.push_str(" AND period_start <= ? AND ? <= period_end");
            values.push(Value::from(format_date(&end)));
            values.push(Value::from(format_date(&start)));
        }
        sql.push_str(" ORDER BY period_start ASC, region_id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let revenues = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(revenues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup() -> RevenueRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::initialize_schema(&conn).unwrap();
        RevenueRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn make(id: &str, region: &str, start: NaiveDate, end: NaiveDate) -> RegionalRevenue {
        let now = Utc::now();
        RegionalRevenue {
            id: id.to_string(),
            region_id: region.to_string(),
            licensee_id: Some("L1".to_string()),
            period_start: start,
            period_end: end,
            total_revenue: Decimal::new(100_000, 0),
            licensee_share: Decimal::new(15_000, 0),
            hrm8_share: Decimal::new(85_000, 0),
            status: RevenueStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_overlapping_period_is_rejected() {
        let repo = setup();
        assert_eq!(
            repo.insert_checked(&make("RV1", "R1", d(2026, 1, 1), d(2026, 1, 31)))
                .unwrap(),
            RevenueWriteOutcome::Written
        );
        assert_eq!(
            repo.insert_checked(&make("RV2", "R1", d(2026, 1, 31), d(2026, 2, 27)))
                .unwrap(),
            RevenueWriteOutcome::Overlap {
                conflicting_id: "RV1".to_string()
            }
        );
        // 其他区域不受影响
        assert_eq!(
            repo.insert_checked(&make("RV3", "R2", d(2026, 1, 1), d(2026, 1, 31)))
                .unwrap(),
            RevenueWriteOutcome::Written
        );
    }

    #[test]
    fn test_update_only_while_pending() {
        let repo = setup();
        let mut rev = make("RV1", "R1", d(2026, 1, 1), d(2026, 1, 31));
        repo.insert_checked(&rev).unwrap();

        rev.total_revenue = Decimal::new(200_000, 0);
        rev.licensee_share = Decimal::new(30_000, 0);
        rev.hrm8_share = Decimal::new(170_000, 0);
        assert_eq!(repo.update_checked(&rev).unwrap(), RevenueWriteOutcome::Written);

        let now = Utc::now();
        assert!(repo
            .update_status_if("RV1", RevenueStatus::Pending, RevenueStatus::Confirmed, None, now)
            .unwrap());
        assert_eq!(repo.update_checked(&rev).unwrap(), RevenueWriteOutcome::NotPending);
        assert_eq!(
            repo.find_by_id("RV1").unwrap().unwrap().total_revenue,
            Decimal::new(200_000, 0)
        );
    }

    #[test]
    fn test_query_filters() {
        let repo = setup();
        repo.insert_checked(&make("RV1", "R1", d(2026, 1, 1), d(2026, 1, 31)))
            .unwrap();
        repo.insert_checked(&make("RV2", "R1", d(2026, 2, 1), d(2026, 2, 28)))
            .unwrap();
        let mut other = make("RV3", "R2", d(2026, 2, 1), d(2026, 2, 28));
        other.licensee_id = None;
        repo.insert_checked(&other).unwrap();

        let feb = repo
            .query(&RevenueFilter {
                overlaps: Some((d(2026, 2, 10), d(2026, 2, 20))),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(feb.len(), 2);

        let l1 = repo
            .query(&RevenueFilter {
                licensee_id: Some("L1".to_string()),
                status: Some(RevenueStatus::Pending),
                ..Default::default()
            })
            .unwrap();
        let ids: Vec<_> = l1.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["RV1", "RV2"]);
    }
}
