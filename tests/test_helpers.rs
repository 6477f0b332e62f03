// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供临时数据库、AppState 装配、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use hrm8_sales_engine::app::AppState;
use hrm8_sales_engine::domain::{
    Availability, Company, Consultant, ConsultantRole, ConsultantStatus, Job, LicenseeStatus,
    PaymentStatus, Region, RegionalLicensee, ServicePackage, Settlement, SettlementStatus,
    Subscription, SubscriptionStatus,
};
use rust_decimal::Decimal;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库路径 (文件由 AppState 建表)
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("temp path is not utf-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// 创建临时数据库并装配 AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    hrm8_sales_engine::logging::init_test();
    let state = AppState::new(db_path).expect("Failed to build AppState");
    (temp_file, state)
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn money(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

// ==========================================
// 测试数据生成
// ==========================================

pub fn seed_company(state: &AppState, id: &str, referred_by: Option<&str>) -> Company {
    let mut company = Company::new(id, format!("Company {}", id), ts(2025, 1, 1));
    company.referred_by = referred_by.map(str::to_string);
    state.repos.companies.insert(&company).unwrap();
    company
}

pub fn recruiter(id: &str, region: &str, current: i32, max: i32) -> Consultant {
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

pub fn seed_consultant(state: &AppState, consultant: Consultant) -> Consultant {
    state.repos.consultants.insert(&consultant).unwrap();
    consultant
}

pub fn seed_job(
    state: &AppState,
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
    state.repos.jobs.insert(&job).unwrap();
    job
}

pub fn seed_subscription(state: &AppState, id: &str, company_id: &str, start: NaiveDate) {
    state
        .repos
        .subscriptions
        .insert(&Subscription {
            id: id.to_string(),
            company_id: company_id.to_string(),
            start_date: start,
            status: SubscriptionStatus::Active,
        })
        .unwrap();
}

pub fn seed_licensee(
    state: &AppState,
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
    state.repos.licensees.insert(&licensee).unwrap();
    licensee
}

pub fn seed_region(state: &AppState, id: &str, licensee_id: Option<&str>) -> Region {
    let region = Region {
        id: id.to_string(),
        name: format!("Region {}", id),
        licensee_id: licensee_id.map(str::to_string),
        is_active: true,
    };
    state.repos.regions.insert(&region).unwrap();
    region
}

pub fn seed_pending_settlement(
    state: &AppState,
    id: &str,
    licensee_id: &str,
    generated_at: DateTime<Utc>,
) {
    state
        .repos
        .settlements
        .insert(&Settlement {
            id: id.to_string(),
            licensee_id: licensee_id.to_string(),
            period_start: date(2026, 1, 1),
            period_end: date(2026, 1, 31),
            total_amount: Decimal::new(5000, 0),
            status: SettlementStatus::Pending,
            generated_at,
            paid_at: None,
        })
        .unwrap();
}
