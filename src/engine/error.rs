// ==========================================
// HRM8 销售引擎 - 引擎层错误类型
// ==========================================
// 职责: 各服务的业务错误 (校验/状态冲突) + 基础设施错误包装
// 红线: 每个变体的消息必须可区分, 调用方可直接展示
// ==========================================

use crate::config::ConfigError;
use crate::domain::{CommissionStatus, LicenseeStatus, RevenueStatus};
use crate::repository::RepositoryError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

// ==========================================
// 归属
// ==========================================
#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("company not found: {0}")]
    CompanyNotFound(String),

    #[error("attribution locked to {owner} until {locked_until}")]
    Locked {
        company_id: String,
        owner: String,
        locked_until: DateTime<Utc>,
    },

    #[error("no agent assigned to company {0}")]
    NoAttributionAssigned(String),

    #[error("concurrent attribution update on company {0}")]
    ConcurrentUpdate(String),

    #[error("renewal window of {0} days is out of range")]
    WindowOutOfRange(i64),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

// ==========================================
// 顾问分配
// ==========================================
#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("consultant not found: {0}")]
    ConsultantNotFound(String),

    #[error("not eligible: {reason}")]
    NotEligible {
        consultant_id: String,
        reason: String,
    },

    #[error("consultant {0} has no remaining capacity")]
    CapacityExhausted(String),

    #[error("no eligible consultant for job {job_id}: {reason}")]
    NoMatch { job_id: String, reason: String },

    #[error("job {0} has no active assignment")]
    NotAssigned(String),

    #[error("concurrent assignment update on job {0}")]
    ConcurrentUpdate(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

// ==========================================
// 佣金
// ==========================================
#[derive(Error, Debug)]
pub enum CommissionError {
    #[error("commission not found: {0}")]
    NotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("invalid commission transition {from} -> {to} for {commission_id}")]
    InvalidTransition {
        commission_id: String,
        from: CommissionStatus,
        to: CommissionStatus,
    },

    #[error("commission amount is frozen once {status}: {commission_id}")]
    AmountFrozen {
        commission_id: String,
        status: CommissionStatus,
    },

    #[error("negative amount not allowed: {0}")]
    NegativeAmount(Decimal),

    #[error("commission rate out of range [0, 1]: {0}")]
    InvalidRate(Decimal),

    #[error("service package {0} does not include placement")]
    PackageExcludesPlacement(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

// ==========================================
// 区域收入分账
// ==========================================
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("revenue record not found: {0}")]
    NotFound(String),

    #[error("region not found: {0}")]
    RegionNotFound(String),

    #[error("licensee not found: {0}")]
    LicenseeNotFound(String),

    #[error("split mismatch: {licensee_share} + {hrm8_share} != {total_revenue}")]
    SplitMismatch {
        total_revenue: Decimal,
        licensee_share: Decimal,
        hrm8_share: Decimal,
    },

    #[error("negative amount not allowed: {0}")]
    NegativeAmount(Decimal),

    #[error("HRM8-owned region {0} cannot carry a licensee share")]
    LicenseeShareOnOwnedRegion(String),

    #[error("invalid period: {start} is after {end}")]
    InvalidPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("period overlaps existing record {conflicting_id} in region {region_id}")]
    PeriodOverlap {
        region_id: String,
        conflicting_id: String,
    },

    #[error("revenue record {revenue_id} is {status}, only PENDING records can be edited")]
    NotEditable {
        revenue_id: String,
        status: RevenueStatus,
    },

    #[error("invalid revenue transition {from} -> {to} for {revenue_id}")]
    InvalidTransition {
        revenue_id: String,
        from: RevenueStatus,
        to: RevenueStatus,
    },

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

// ==========================================
// 被许可方
// ==========================================
#[derive(Error, Debug)]
pub enum LicenseeError {
    #[error("licensee not found: {0}")]
    NotFound(String),

    #[error("invalid licensee transition {from} -> {to} for {licensee_id}")]
    InvalidTransition {
        licensee_id: String,
        from: LicenseeStatus,
        to: LicenseeStatus,
    },

    #[error("concurrent licensee update on {0}")]
    ConcurrentUpdate(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

// ==========================================
// 合规扫描
// ==========================================
#[derive(Error, Debug)]
pub enum ComplianceError {
    #[error("licensee not found: {0}")]
    LicenseeNotFound(String),

    #[error("inactivity window of {0} days is out of range")]
    WindowOutOfRange(i64),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

// ==========================================
// 支付事件
// ==========================================
#[derive(Error, Debug)]
pub enum PaymentEventError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("job {job_id} belongs to company {actual}, event says {claimed}")]
    CompanyMismatch {
        job_id: String,
        claimed: String,
        actual: String,
    },

    #[error("negative amount not allowed: {0}")]
    NegativeAmount(Decimal),

    #[error(transparent)]
    Attribution(#[from] AttributionError),

    #[error(transparent)]
    Commission(#[from] CommissionError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
