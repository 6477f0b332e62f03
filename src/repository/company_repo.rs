// ==========================================
// HRM8 销售引擎 - 客户公司数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 归属字段只通过比较并交换写入
// ==========================================

use crate::domain::{AttributionState, Company, CompanyPatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{format_opt_ts, format_ts, get_opt_ts, get_ts};
use crate::repository::stores::CompanyStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    company_id, name, region_id, referred_by,
    attribution_locked, attribution_locked_at, created_at, updated_at
"#;

// ==========================================
// CompanyRepository - 公司仓储
// ==========================================
pub struct CompanyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompanyRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Company> {
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            region_id: row.get(2)?,
            referred_by: row.get(3)?,
            attribution_locked: row.get::<_, i64>(4)? != 0,
            attribution_locked_at: get_opt_ts(row, 5)?,
            created_at: get_ts(row, 6)?,
            updated_at: get_ts(row, 7)?,
        })
    }
}

impl CompanyStore for CompanyRepository {
    fn find_by_id(&self, company_id: &str) -> RepositoryResult<Option<Company>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM company WHERE company_id = ?1", SELECT_COLUMNS);
        let company = conn
            .query_row(&sql, params![company_id], Self::map_row)
            .optional()?;
        Ok(company)
    }

    fn insert(&self, company: &Company) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO company (
                company_id, name, region_id, referred_by,
                attribution_locked, attribution_locked_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                company.id,
                company.name,
                company.region_id,
                company.referred_by,
                company.attribution_locked as i64,
                format_opt_ts(&company.attribution_locked_at),
                format_ts(&company.created_at),
                format_ts(&company.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update_profile(
        &self,
        company_id: &str,
        patch: &CompanyPatch,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let sql = format!("SELECT {} FROM company WHERE company_id = ?1", SELECT_COLUMNS);
        let current = tx
            .query_row(&sql, params![company_id], Self::map_row)
            .optional()?;
        let mut company = match current {
            Some(c) => c,
            None => return Ok(false),
        };

        patch.apply(&mut company);
        tx.execute(
            "UPDATE company SET name = ?2, region_id = ?3, updated_at = ?4 WHERE company_id = ?1",
            params![company_id, company.name, company.region_id, format_ts(&now)],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn compare_and_set_attribution(
        &self,
        company_id: &str,
        expected: &AttributionState,
        next: &AttributionState,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        // IS 比较可以匹配 NULL
        let rows = conn.execute(
            r#"
            UPDATE company
            SET referred_by = ?5,
                attribution_locked = ?6,
                attribution_locked_at = ?7,
                updated_at = ?8
            WHERE company_id = ?1
              AND referred_by IS ?2
              AND attribution_locked = ?3
              AND attribution_locked_at IS ?4
            "#,
            params![
                company_id,
                expected.referred_by,
                expected.attribution_locked as i64,
                format_opt_ts(&expected.attribution_locked_at),
                next.referred_by,
                next.attribution_locked as i64,
                format_opt_ts(&next.attribution_locked_at),
                format_ts(&now),
            ],
        )?;
        Ok(rows == 1)
    }

    fn list_locked(&self) -> RepositoryResult<Vec<Company>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM company WHERE attribution_locked = 1 ORDER BY attribution_locked_at ASC, company_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let companies = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(companies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn setup() -> CompanyRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::initialize_schema(&conn).unwrap();
        CompanyRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_cas_rejects_stale_expectation() {
        let repo = setup();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut company = Company::new("C1", "Acme", now);
        company.referred_by = Some("A1".to_string());
        repo.insert(&company).unwrap();

        let expected = company.attribution_state();
        let locked = expected.locked_at(now);
        assert!(repo
            .compare_and_set_attribution("C1", &expected, &locked, now)
            .unwrap());
        // 同一期望值再次写入必须失败
        assert!(!repo
            .compare_and_set_attribution("C1", &expected, &locked, now)
            .unwrap());

        let stored = repo.find_by_id("C1").unwrap().unwrap();
        assert!(stored.attribution_locked);
        assert_eq!(stored.attribution_locked_at, Some(now));
        assert_eq!(repo.list_locked().unwrap().len(), 1);
    }

    #[test]
    fn test_update_profile_keeps_attribution() {
        let repo = setup();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut company = Company::new("C1", "Acme", now);
        company.referred_by = Some("A1".to_string());
        repo.insert(&company).unwrap();

        let patch = CompanyPatch {
            name: Some("Acme Holdings".to_string()),
            region_id: Some(Some("R1".to_string())),
        };
        assert!(repo.update_profile("C1", &patch, now).unwrap());
        assert!(!repo.update_profile("missing", &patch, now).unwrap());

        let stored = repo.find_by_id("C1").unwrap().unwrap();
        assert_eq!(stored.name, "Acme Holdings");
        assert_eq!(stored.referred_by.as_deref(), Some("A1"));
    }
}
