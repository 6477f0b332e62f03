// ==========================================
// HRM8 销售引擎 - Sales Core 纯函数库
// ==========================================
// 职责: 时间窗口、金额舍入、佣金金额、收入分账的纯计算
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// 归属锁定保护期 (月)
pub const ATTRIBUTION_LOCK_MONTHS: u32 = 12;

/// 套餐销售佣金的过期窗口 (月)
pub const SALES_COMMISSION_EXPIRY_MONTHS: u32 = 12;

// ==========================================
// SalesCore - 纯函数工具类
// ==========================================
pub struct SalesCore;

impl SalesCore {
    /// 按日历月相加; 目标月份没有对应日期时取月末 (例如 2/29 + 12 个月 -> 2/28)
    pub fn add_months(ts: DateTime<Utc>, months: u32) -> DateTime<Utc> {
        ts.checked_add_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn add_months_to_date(date: NaiveDate, months: u32) -> NaiveDate {
        date.checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX)
    }

    /// 按天数平移时刻; 超出 chrono 可表示范围时返回 None
    pub fn shift_days(ts: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
        ts.checked_add_signed(Duration::try_days(days)?)
    }

    /// 锁定到期时刻 = locked_at + 12 个月
    pub fn lock_expires_at(locked_at: DateTime<Utc>) -> DateTime<Utc> {
        Self::add_months(locked_at, ATTRIBUTION_LOCK_MONTHS)
    }

    /// 锁定是否仍在保护期内
    ///
    /// # 规则
    /// - attribution_locked = true 且 now < locked_at + 12 个月
    /// - 恰好满 12 个月时已过期
    /// - 锁定标志为真但缺少 locked_at 属于数据不一致, 视为未锁定
    pub fn is_lock_active(
        attribution_locked: bool,
        attribution_locked_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match (attribution_locked, attribution_locked_at) {
            (true, Some(locked_at)) => now < Self::lock_expires_at(locked_at),
            _ => false,
        }
    }

    /// 锚点是否已满 months 个月 (恰好满月即算满)
    pub fn has_aged_past(anchor: DateTime<Utc>, months: u32, now: DateTime<Utc>) -> bool {
        Self::add_months(anchor, months) <= now
    }

    /// 日期锚点版本, 以当天 00:00 UTC 为起点
    pub fn date_has_aged_past(anchor: NaiveDate, months: u32, now: DateTime<Utc>) -> bool {
        Self::add_months_to_date(anchor, months)
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc() <= now)
            .unwrap_or(false)
    }

    /// 金额保留两位小数 (四舍五入, 0.005 -> 0.01)
    pub fn round_money(value: Decimal) -> Decimal {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        // 固定两位小数
        rounded.rescale(2);
        rounded
    }

    /// 佣金金额 = round2(price × rate)
    pub fn commission_amount(price: Decimal, rate: Decimal) -> Decimal {
        Self::round_money(price * rate)
    }

    /// 按百分比分账
    ///
    /// # 规则
    /// - licensee_share = round2(total × percent / 100)
    /// - hrm8_share = total − licensee_share (减法, 保证两者之和精确等于 total)
    pub fn split_by_percent(total: Decimal, percent: Decimal) -> (Decimal, Decimal) {
        let licensee_share = Self::round_money(total * percent / Decimal::ONE_HUNDRED);
        (licensee_share, total - licensee_share)
    }

    /// 日历月首日与末日
    pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = start.checked_add_months(Months::new(1))?;
        Some((start, next.pred_opt()?))
    }

    /// 今天之前的两个完整日历月: (上月, 上上月)
    pub fn previous_two_months(
        today: NaiveDate,
    ) -> Option<((NaiveDate, NaiveDate), (NaiveDate, NaiveDate))> {
        let this_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
        let last = this_month.checked_sub_months(Months::new(1))?;
        let before_last = this_month.checked_sub_months(Months::new(2))?;
        Some((
            Self::month_bounds(last.year(), last.month())?,
            Self::month_bounds(before_last.year(), before_last.month())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_lock_expires_exactly_at_twelve_months() {
        let locked_at = Utc.with_ymd_and_hms(2025, 3, 15, 10, 30, 0).unwrap();
        let expiry = Utc.with_ymd_and_hms(2026, 3, 15, 10, 30, 0).unwrap();

        assert!(SalesCore::is_lock_active(true, Some(locked_at), locked_at));
        assert!(SalesCore::is_lock_active(
            true,
            Some(locked_at),
            expiry - Duration::seconds(1)
        ));
        assert!(!SalesCore::is_lock_active(true, Some(locked_at), expiry));
        assert!(!SalesCore::is_lock_active(false, Some(locked_at), locked_at));
        assert!(!SalesCore::is_lock_active(true, None, locked_at));
    }

    #[test]
    fn test_leap_day_lock_clamps_to_month_end() {
        let locked_at = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(
            SalesCore::lock_expires_at(locked_at),
            Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_commission_amount_rounding() {
        // 1990 × 0.10 = 199.00
        assert_eq!(
            SalesCore::commission_amount(Decimal::new(1990, 0), Decimal::new(10, 2)),
            Decimal::new(19900, 2)
        );
        // 0.125 -> 0.13 (midpoint away from zero)
        assert_eq!(
            SalesCore::commission_amount(Decimal::new(125, 2), Decimal::new(10, 2)),
            Decimal::new(13, 2)
        );
    }

    #[test]
    fn test_split_always_balances() {
        let total = Decimal::new(10_000_033, 2); // 100000.33
        for pct in 0..=100 {
            let percent = Decimal::new(pct, 0) + Decimal::new(33, 2);
            let percent = percent.min(Decimal::ONE_HUNDRED);
            let (licensee, hrm8) = SalesCore::split_by_percent(total, percent);
            assert_eq!(licensee + hrm8, total, "percent={}", percent);
            assert_eq!(licensee.scale().max(2), 2);
        }
    }

    #[test]
    fn test_split_fifteen_percent() {
        let (licensee, hrm8) =
            SalesCore::split_by_percent(Decimal::new(100_000, 0), Decimal::new(15, 0));
        assert_eq!(licensee, Decimal::new(1_500_000, 2));
        assert_eq!(hrm8, Decimal::new(8_500_000, 2));
    }

    #[test]
    fn test_previous_two_months_across_year() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let ((last_start, last_end), (prev_start, prev_end)) =
            SalesCore::previous_two_months(today).unwrap();
        assert_eq!(last_start, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(last_end, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(prev_start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(prev_end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_date_anchor_age() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let just_before = Utc.with_ymd_and_hms(2026, 5, 31, 23, 59, 59).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert!(!SalesCore::date_has_aged_past(start, 12, just_before));
        assert!(SalesCore::date_has_aged_past(start, 12, at));
    }

    #[test]
    fn test_shift_days_out_of_range_is_none() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        assert_eq!(
            SalesCore::shift_days(now, 30),
            Some(Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(SalesCore::shift_days(now, i64::MAX), None);
        assert_eq!(SalesCore::shift_days(now, -i64::MAX), None);
    }
}
