// ==========================================
// 引擎层单元测试夹具 (仅 cfg(test))
// ==========================================

use crate::config::ConfigManager;
use crate::domain::{
    Availability, Company, Consultant, ConsultantRole, ConsultantStatus, Job, PaymentStatus,
    Region, RegionalLicensee, LicenseeStatus, ServicePackage,
};
use crate::engine::events::OptionalNotificationPublisher;
use crate::engine::repositories::SalesRepositories;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

pub struct Fixture {
    pub conn: Arc<Mutex<Connection>>,
    pub repos: SalesRepositories,
    pub config: Arc<ConfigManager>,
    pub notifier: OptionalNotificationPublisher,
}

pub fn fixture() -> Fixture {
    crate::logging::init_test();
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::initialize_schema(&conn).unwrap();
    let conn = Arc::new(Mutex::new(conn));
    Fixture {
        repos: SalesRepositories::sqlite(conn.clone()),
        config: Arc::new(ConfigManager::from_connection(conn.clone()).unwrap()),
        notifier: OptionalNotificationPublisher::none(),
        conn,
    }
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn seed_company(fx: &Fixture, id: &str, referred_by: Option<&str>) -> Company {
    let mut company = Company::new(id, format!("Company {}", id), ts(2025, 1, 1));
    company.referred_by = referred_by.map(str::to_string);
    fx.repos.companies.insert(&company).unwrap();
    company
}

pub fn consultant(id: &str, region: &str, current: i32, max: i32) -> Consultant {
    let now = ts(2025, 1, 1);
    Consultant {
        id: id.to_string(),
        name: format!("Consultant {}", id),
        role: ConsultantRole::Recruiter,
        status: ConsultantStatus::Active,
        availability: Availability::Available,
        region_id: Some(region.to_string()),
        current_jobs: current,
        max_jobs: max,
        industry_expertise: vec![],
        success_rate: 0.0,
        average_days_to_fill: None,
        default_commission_rate: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn seed_consultant(fx: &Fixture, consultant: Consultant) -> Consultant {
    fx.repos.consultants.insert(&consultant).unwrap();
    consultant
}

pub fn seed_job(
    fx: &Fixture,
    id: &str,
    company_id: &str,
    region: Option<&str>,
    category: Option<&str>,
    package: ServicePackage,
) -> Job {
    let now = ts(2025, 1, 1);
    let job = Job {
        id: id.to_string(),
        company_id: company_id.to_string(),
        title: format!("Job {}", id),
        region_id: region.map(str::to_string),
        category: category.map(str::to_string),
        assigned_consultant_id: None,
        service_package: package,
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    fx.repos.jobs.insert(&job).unwrap();
    job
}

pub fn seed_region(fx: &Fixture, id: &str, licensee_id: Option<&str>) -> Region {
    let region = Region {
        id: id.to_string(),
        name: format!("Region {}", id),
        licensee_id: licensee_id.map(str::to_string),
        is_active: true,
    };
    fx.repos.regions.insert(&region).unwrap();
    region
}

pub fn seed_licensee(
    fx: &Fixture,
    id: &str,
    percent: i64,
    agreement_end: Option<NaiveDate>,
) -> RegionalLicensee {
    let licensee = RegionalLicensee {
        id: id.to_string(),
        name: format!("Licensee {}", id),
        revenue_share_percent: Decimal::new(percent, 0),
        agreement_start_date: date(2024, 1, 1),
        agreement_end_date: agreement_end,
        status: LicenseeStatus::Active,
        updated_at: ts(2025, 1, 1),
    };
    fx.repos.licensees.insert(&licensee).unwrap();
    licensee
}
