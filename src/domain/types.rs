// ==========================================
// HRM8 销售引擎 - 领域类型定义
// ==========================================
// 职责: 各实体共享的枚举类型
// 约定: 数据库存储格式统一为 SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 顾问角色 (Consultant Role)
// ==========================================
// 只有 RECRUITER / CONSULTANT_360 可以参与自动分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsultantRole {
    #[serde(rename = "RECRUITER")]
    Recruiter,
    #[serde(rename = "CONSULTANT_360")]
    Consultant360,
    #[serde(rename = "SALES_AGENT")]
    SalesAgent,
}

impl ConsultantRole {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RECRUITER" => Some(ConsultantRole::Recruiter),
            "CONSULTANT_360" => Some(ConsultantRole::Consultant360),
            "SALES_AGENT" => Some(ConsultantRole::SalesAgent),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConsultantRole::Recruiter => "RECRUITER",
            ConsultantRole::Consultant360 => "CONSULTANT_360",
            ConsultantRole::SalesAgent => "SALES_AGENT",
        }
    }

    /// 是否可以承接招聘岗位
    pub fn can_recruit(&self) -> bool {
        matches!(self, ConsultantRole::Recruiter | ConsultantRole::Consultant360)
    }
}

impl fmt::Display for ConsultantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 顾问状态 (Consultant Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultantStatus {
    Active,    // 在职
    Inactive,  // 停用
    Suspended, // 暂停
}

impl ConsultantStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(ConsultantStatus::Active),
            "INACTIVE" => Some(ConsultantStatus::Inactive),
            "SUSPENDED" => Some(ConsultantStatus::Suspended),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConsultantStatus::Active => "ACTIVE",
            ConsultantStatus::Inactive => "INACTIVE",
            ConsultantStatus::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for ConsultantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 顾问可用性 (Availability)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,   // 可接单
    AtCapacity,  // 满负荷
    Unavailable, // 休假等
}

impl Availability {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "AVAILABLE" => Some(Availability::Available),
            "AT_CAPACITY" => Some(Availability::AtCapacity),
            "UNAVAILABLE" => Some(Availability::Unavailable),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Availability::Available => "AVAILABLE",
            Availability::AtCapacity => "AT_CAPACITY",
            Availability::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 分配关系状态 / 来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

impl AssignmentStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(AssignmentStatus::Active),
            "INACTIVE" => Some(AssignmentStatus::Inactive),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "ACTIVE",
            AssignmentStatus::Inactive => "INACTIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentSource {
    Auto,   // 自动匹配
    Manual, // 人工指派
}

impl AssignmentSource {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "AUTO" => Some(AssignmentSource::Auto),
            "MANUAL" => Some(AssignmentSource::Manual),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentSource::Auto => "AUTO",
            AssignmentSource::Manual => "MANUAL",
        }
    }
}

// ==========================================
// 服务套餐 (Service Package)
// ==========================================
// SELF_MANAGED / SHORTLISTING 只覆盖寻访, 不产生 PLACEMENT 佣金
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicePackage {
    SelfManaged,
    Shortlisting,
    FullService,
    ExecutiveSearch,
}

impl ServicePackage {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SELF_MANAGED" => Some(ServicePackage::SelfManaged),
            "SHORTLISTING" => Some(ServicePackage::Shortlisting),
            "FULL_SERVICE" => Some(ServicePackage::FullService),
            "EXECUTIVE_SEARCH" => Some(ServicePackage::ExecutiveSearch),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ServicePackage::SelfManaged => "SELF_MANAGED",
            ServicePackage::Shortlisting => "SHORTLISTING",
            ServicePackage::FullService => "FULL_SERVICE",
            ServicePackage::ExecutiveSearch => "EXECUTIVE_SEARCH",
        }
    }

    /// 套餐是否包含招聘交付 (录用即产生 PLACEMENT 佣金)
    pub fn includes_recruitment(&self) -> bool {
        matches!(
            self,
            ServicePackage::FullService | ServicePackage::ExecutiveSearch
        )
    }
}

impl fmt::Display for ServicePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 岗位付款状态 (Payment Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

// ==========================================
// 佣金类型 / 状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionType {
    SubscriptionSale, // 套餐销售
    Placement,        // 招聘录用
}

impl CommissionType {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SUBSCRIPTION_SALE" => Some(CommissionType::SubscriptionSale),
            "PLACEMENT" => Some(CommissionType::Placement),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CommissionType::SubscriptionSale => "SUBSCRIPTION_SALE",
            CommissionType::Placement => "PLACEMENT",
        }
    }
}

impl fmt::Display for CommissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// 状态机: PENDING -> CONFIRMED -> PAID, PENDING -> CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Pending,
    Confirmed,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(CommissionStatus::Pending),
            "CONFIRMED" => Some(CommissionStatus::Confirmed),
            "PAID" => Some(CommissionStatus::Paid),
            "CANCELLED" => Some(CommissionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "PENDING",
            CommissionStatus::Confirmed => "CONFIRMED",
            CommissionStatus::Paid => "PAID",
            CommissionStatus::Cancelled => "CANCELLED",
        }
    }

    /// 金额是否已冻结 (CONFIRMED / PAID 后不可修改)
    pub fn amount_frozen(&self) -> bool {
        matches!(self, CommissionStatus::Confirmed | CommissionStatus::Paid)
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 订阅状态 (Subscription Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(SubscriptionStatus::Active),
            "CANCELLED" => Some(SubscriptionStatus::Cancelled),
            "EXPIRED" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Cancelled => "CANCELLED",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }
}

// ==========================================
// 区域分账状态 (Revenue Status)
// ==========================================
// 状态机: PENDING -> CONFIRMED -> PAID, 不可跳级, 不可回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueStatus {
    Pending,
    Confirmed,
    Paid,
}

impl RevenueStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(RevenueStatus::Pending),
            "CONFIRMED" => Some(RevenueStatus::Confirmed),
            "PAID" => Some(RevenueStatus::Paid),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RevenueStatus::Pending => "PENDING",
            RevenueStatus::Confirmed => "CONFIRMED",
            RevenueStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for RevenueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 区域被许可方状态 (Licensee Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseeStatus {
    Active,
    Suspended,
    Terminated,
}

impl LicenseeStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(LicenseeStatus::Active),
            "SUSPENDED" => Some(LicenseeStatus::Suspended),
            "TERMINATED" => Some(LicenseeStatus::Terminated),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LicenseeStatus::Active => "ACTIVE",
            LicenseeStatus::Suspended => "SUSPENDED",
            LicenseeStatus::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for LicenseeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// ==========================================
// 结算单状态 (Settlement Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Pending,
    Paid,
}

impl SettlementStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(SettlementStatus::Pending),
            "PAID" => Some(SettlementStatus::Paid),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "PENDING",
            SettlementStatus::Paid => "PAID",
        }
    }
}

// ==========================================
// 告警级别 (Alert Severity)
// ==========================================
// 排序: CRITICAL > HIGH > MEDIUM > LOW
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertSeverity {
    /// 排序权重, 越小越靠前
    pub fn rank(&self) -> u8 {
        match self {
            AlertSeverity::Critical => 0,
            AlertSeverity::High => 1,
            AlertSeverity::Medium => 2,
            AlertSeverity::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "CRITICAL",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::Low => "LOW",
        }
    }

    pub fn all() -> [AlertSeverity; 4] {
        [
            AlertSeverity::Critical,
            AlertSeverity::High,
            AlertSeverity::Medium,
            AlertSeverity::Low,
        ]
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 告警类型 (Alert Type)
// ==========================================
// 声明顺序即检测器顺序, 同级别告警按此顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    OverduePayout,
    InactiveRegion,
    RevenueDecline,
    AgreementExpiry,
}

impl AlertType {
    pub fn rank(&self) -> u8 {
        match self {
            AlertType::OverduePayout => 0,
            AlertType::InactiveRegion => 1,
            AlertType::RevenueDecline => 2,
            AlertType::AgreementExpiry => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::OverduePayout => "OVERDUE_PAYOUT",
            AlertType::InactiveRegion => "INACTIVE_REGION",
            AlertType::RevenueDecline => "REVENUE_DECLINE",
            AlertType::AgreementExpiry => "AGREEMENT_EXPIRY",
        }
    }

    pub fn all() -> [AlertType; 4] {
        [
            AlertType::OverduePayout,
            AlertType::InactiveRegion,
            AlertType::RevenueDecline,
            AlertType::AgreementExpiry,
        ]
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_db_round_trip_and_recruit_gate() {
        for role in [
            ConsultantRole::Recruiter,
            ConsultantRole::Consultant360,
            ConsultantRole::SalesAgent,
        ] {
            assert_eq!(ConsultantRole::from_db_str(role.to_db_str()), Some(role));
        }
        assert!(ConsultantRole::Consultant360.can_recruit());
        assert!(!ConsultantRole::SalesAgent.can_recruit());
        assert_eq!(ConsultantRole::from_db_str("ADMIN"), None);
    }

    #[test]
    fn test_role_serde_uses_db_names() {
        let json = serde_json::to_string(&ConsultantRole::Consultant360).unwrap();
        assert_eq!(json, "\"CONSULTANT_360\"");
    }

    #[test]
    fn test_severity_rank_order() {
        let mut all = vec![
            AlertSeverity::Low,
            AlertSeverity::Critical,
            AlertSeverity::Medium,
            AlertSeverity::High,
        ];
        all.sort_by_key(|s| s.rank());
        assert_eq!(all, AlertSeverity::all().to_vec());
    }

    #[test]
    fn test_sourcing_packages_exclude_placement() {
        assert!(!ServicePackage::Shortlisting.includes_recruitment());
        assert!(!ServicePackage::SelfManaged.includes_recruitment());
        assert!(ServicePackage::FullService.includes_recruitment());
    }

    #[test]
    fn test_commission_amount_frozen_states() {
        assert!(!CommissionStatus::Pending.amount_frozen());
        assert!(CommissionStatus::Confirmed.amount_frozen());
        assert!(CommissionStatus::Paid.amount_frozen());
    }
}
