// ==========================================
// HRM8 销售引擎 - 区域 / 区域被许可方数据仓储
// ==========================================
// 红线: 被许可方状态只做条件迁移 (WHERE status = expected)
// ==========================================

use crate::domain::{LicenseeStatus, Region, RegionalLicensee};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    format_date, format_opt_date, format_ts, get_date, get_decimal, get_enum, get_opt_date, get_ts,
};
use crate::repository::stores::{LicenseeStore, RegionStore};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// RegionRepository - 区域仓储
// ==========================================
pub struct RegionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RegionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Region> {
        Ok(Region {
            id: row.get(0)?,
            name: row.get(1)?,
            licensee_id: row.get(2)?,
            is_active: row.get::<_, i64>(3)? != 0,
        })
    }
}

impl RegionStore for RegionRepository {
    fn find_by_id(&self, region_id: &str) -> RepositoryResult<Option<Region>> {
        let conn = self.get_conn()?;
        let region = conn
            .query_row(
                "SELECT region_id, name, licensee_id, is_active FROM region WHERE region_id = ?1",
                params![region_id],
                Self::map_row,
            )
            .optional()?;
        Ok(region)
    }

    fn insert(&self, region: &Region) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO region (region_id, name, licensee_id, is_active) VALUES (?1, ?2, ?3, ?4)",
            params![
                region.id,
                region.name,
                region.licensee_id,
                region.is_active as i64
            ],
        )?;
        Ok(())
    }

    fn list_all(&self) -> RepositoryResult<Vec<Region>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT region_id, name, licensee_id, is_active FROM region ORDER BY region_id ASC",
        )?;
        let regions = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(regions)
    }
}

// ==========================================
// LicenseeRepository - 区域被许可方仓储
// ==========================================
pub struct LicenseeRepository {
    conn: Arc<Mutex<Connection>>,
}

const LICENSEE_COLUMNS: &str = r#"
    licensee_id, name, revenue_share_percent, agreement_start_date,
    agreement_end_date, status, updated_at
"#;

impl LicenseeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RegionalLicensee> {
        Ok(RegionalLicensee {
            id: row.get(0)?,
            name: row.get(1)?,
            revenue_share_percent: get_decimal(row, 2)?,
            agreement_start_date: get_date(row, 3)?,
            agreement_end_date: get_opt_date(row, 4)?,
            status: get_enum(row, 5, LicenseeStatus::from_db_str)?,
            updated_at: get_ts(row, 6)?,
        })
    }
}

impl LicenseeStore for LicenseeRepository {
    fn find_by_id(&self, licensee_id: &str) -> RepositoryResult<Option<RegionalLicensee>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM regional_licensee WHERE licensee_id = ?1",
            LICENSEE_COLUMNS
        );
        let licensee = conn
            .query_row(&sql, params![licensee_id], Self::map_row)
            .optional()?;
        Ok(licensee)
    }

    fn insert(&self, licensee: &RegionalLicensee) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO regional_licensee (
                licensee_id, name, revenue_share_percent, agreement_start_date,
                agreement_end_date, status, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                licensee.id,
                licensee.name,
                licensee.revenue_share_percent.to_string(),
                format_date(&licensee.agreement_start_date),
                format_opt_date(&licensee.agreement_end_date),
                licensee.status.to_db_str(),
                format_ts(&licensee.updated_at),
            ],
        )?;
        Ok(())
    }

    fn list_all(&self) -> RepositoryResult<Vec<RegionalLicensee>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM regional_licensee ORDER BY licensee_id ASC",
            LICENSEE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let licensees = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(licensees)
    }

    fn update_status_if(
        &self,
        licensee_id: &str,
        expected: LicenseeStatus,
        next: LicenseeStatus,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE regional_licensee SET status = ?3, updated_at = ?4 \
             WHERE licensee_id = ?1 AND status = ?2",
            params![
                licensee_id,
                expected.to_db_str(),
                next.to_db_str(),
                format_ts(&now)
            ],
        )?;
        Ok(rows == 1)
    }
}
