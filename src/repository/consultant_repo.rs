// ==========================================
// HRM8 销售引擎 - 顾问数据仓储
// ==========================================
// 红线: current_jobs 只通过 try_reserve_capacity / release_capacity 修改
// ==========================================

use crate::domain::{Availability, Consultant, ConsultantPatch, ConsultantRole, ConsultantStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{format_ts, get_enum, get_opt_decimal, get_string_list, get_ts};
use crate::repository::stores::ConsultantStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    consultant_id, name, role, status, availability, region_id,
    current_jobs, max_jobs, industry_expertise, success_rate,
    average_days_to_fill, default_commission_rate, created_at, updated_at
"#;

// ==========================================
// ConsultantRepository - 顾问仓储
// ==========================================
pub struct ConsultantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConsultantRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Consultant> {
        Ok(Consultant {
            id: row.get(0)?,
            name: row.get(1)?,
            role: get_enum(row, 2, ConsultantRole::from_db_str)?,
            status: get_enum(row, 3, ConsultantStatus::from_db_str)?,
            availability: get_enum(row, 4, Availability::from_db_str)?,
            region_id: row.get(5)?,
            current_jobs: row.get(6)?,
            max_jobs: row.get(7)?,
            industry_expertise: get_string_list(row, 8)?,
            success_rate: row.get(9)?,
            average_days_to_fill: row.get(10)?,
            default_commission_rate: get_opt_decimal(row, 11)?,
            created_at: get_ts(row, 12)?,
            updated_at: get_ts(row, 13)?,
        })
    }

    fn expertise_json(consultant: &Consultant) -> RepositoryResult<String> {
        serde_json::to_string(&consultant.industry_expertise).map_err(|e| {
            RepositoryError::InternalError(format!("cannot encode industry_expertise: {}", e))
        })
    }
}

impl ConsultantStore for ConsultantRepository {
    fn find_by_id(&self, consultant_id: &str) -> RepositoryResult<Option<Consultant>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM consultant WHERE consultant_id = ?1",
            SELECT_COLUMNS
        );
        let consultant = conn
            .query_row(&sql, params![consultant_id], Self::map_row)
            .optional()?;
        Ok(consultant)
    }

    fn insert(&self, consultant: &Consultant) -> RepositoryResult<()> {
        let expertise = Self::expertise_json(consultant)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO consultant (
                consultant_id, name, role, status, availability, region_id,
                current_jobs, max_jobs, industry_expertise, success_rate,
                average_days_to_fill, default_commission_rate, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                consultant.id,
                consultant.name,
                consultant.role.to_db_str(),
                consultant.status.to_db_str(),
                consultant.availability.to_db_str(),
                consultant.region_id,
                consultant.current_jobs,
                consultant.max_jobs,
                expertise,
                consultant.success_rate,
                consultant.average_days_to_fill,
                consultant.default_commission_rate.map(|r| r.to_string()),
                format_ts(&consultant.created_at),
                format_ts(&consultant.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update_profile(
        &self,
        consultant_id: &str,
        patch: &ConsultantPatch,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let sql = format!(
            "SELECT {} FROM consultant WHERE consultant_id = ?1",
            SELECT_COLUMNS
        );
        let mut consultant = match tx
            .query_row(&sql, params![consultant_id], Self::map_row)
            .optional()?
        {
            Some(c) => c,
            None => return Ok(false),
        };

        patch.apply(&mut consultant);
        let expertise = Self::expertise_json(&consultant)?;
        tx.execute(
            r#"
            UPDATE consultant
            SET name = ?2, role = ?3, status = ?4, availability = ?5, region_id = ?6,
                max_jobs = ?7, industry_expertise = ?8, success_rate = ?9,
                average_days_to_fill = ?10, default_commission_rate = ?11, updated_at = ?12
            WHERE consultant_id = ?1
            "#,
            params![
                consultant_id,
                consultant.name,
                consultant.role.to_db_str(),
                consultant.status.to_db_str(),
                consultant.availability.to_db_str(),
                consultant.region_id,
                consultant.max_jobs,
                expertise,
                consultant.success_rate,
                consultant.average_days_to_fill,
                consultant.default_commission_rate.map(|r| r.to_string()),
                format_ts(&now),
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn list_by_region(&self, region_id: &str) -> RepositoryResult<Vec<Consultant>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM consultant WHERE region_id = ?1 ORDER BY consultant_id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let consultants = stmt
            .query_map(params![region_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(consultants)
    }

    fn try_reserve_capacity(
        &self,
        consultant_id: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE consultant
            SET current_jobs = current_jobs + 1,
                availability = CASE
                    WHEN current_jobs + 1 >= max_jobs THEN 'AT_CAPACITY'
                    ELSE availability
                END,
                updated_at = ?2
            WHERE consultant_id = ?1
              AND status = 'ACTIVE'
              AND availability <> 'AT_CAPACITY'
              AND current_jobs < max_jobs
            "#,
            params![consultant_id, format_ts(&now)],
        )?;
        Ok(rows == 1)
    }

    fn release_capacity(&self, consultant_id: &str, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE consultant
            SET current_jobs = MAX(current_jobs - 1, 0),
                availability = CASE
                    WHEN availability = 'AT_CAPACITY' THEN 'AVAILABLE'
                    ELSE availability
                END,
                updated_at = ?2
            WHERE consultant_id = ?1
              AND current_jobs > 0
            "#,
            params![consultant_id, format_ts(&now)],
        )?;
        Ok(rows == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn setup() -> ConsultantRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::initialize_schema(&conn).unwrap();
        ConsultantRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn make(id: &str, current: i32, max: i32) -> Consultant {
        let now = Utc::now();
        Consultant {
            id: id.to_string(),
            name: format!("Consultant {}", id),
            role: ConsultantRole::Recruiter,
            status: ConsultantStatus::Active,
            availability: Availability::Available,
            region_id: Some("R1".to_string()),
            current_jobs: current,
            max_jobs: max,
            industry_expertise: vec!["Finance".to_string()],
            success_rate: 80.0,
            average_days_to_fill: Some(30.0),
            default_commission_rate: Some(Decimal::new(10, 2)),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reserve_until_full_then_reject() {
        let repo = setup();
        repo.insert(&make("CO1", 1, 2)).unwrap();
        let now = Utc::now();

        assert!(repo.try_reserve_capacity("CO1", now).unwrap());
        let full = repo.find_by_id("CO1").unwrap().unwrap();
        assert_eq!(full.current_jobs, 2);
        assert_eq!(full.availability, Availability::AtCapacity);

        assert!(!repo.try_reserve_capacity("CO1", now).unwrap());

        assert!(repo.release_capacity("CO1", now).unwrap());
        let freed = repo.find_by_id("CO1").unwrap().unwrap();
        assert_eq!(freed.current_jobs, 1);
        assert_eq!(freed.availability, Availability::Available);
    }

    #[test]
    fn test_release_never_goes_negative() {
        let repo = setup();
        repo.insert(&make("CO1", 0, 2)).unwrap();
        assert!(!repo.release_capacity("CO1", Utc::now()).unwrap());
        assert_eq!(repo.find_by_id("CO1").unwrap().unwrap().current_jobs, 0);
    }

    #[test]
    fn test_list_by_region_round_trips_expertise() {
        let repo = setup();
        repo.insert(&make("CO2", 0, 3)).unwrap();
        repo.insert(&make("CO1", 0, 3)).unwrap();

        let listed = repo.list_by_region("R1").unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CO1", "CO2"]);
        assert_eq!(listed[0].industry_expertise, vec!["Finance".to_string()]);
        assert_eq!(listed[0].default_commission_rate, Some(Decimal::new(10, 2)));
    }
}
