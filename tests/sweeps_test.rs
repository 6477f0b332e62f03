// ==========================================
// 每日清扫 集成测试
// ==========================================
// 测试目标: 清扫编排 / 报告序列化 / 状态码
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use hrm8_sales_engine::config::config_keys;
use hrm8_sales_engine::domain::{CommissionStatus, JobPaidEvent, ServicePackage};
use hrm8_sales_engine::engine::AttributionError;
use test_helpers::{
    create_test_state, date, money, seed_company, seed_job, seed_licensee, seed_subscription, ts,
};

#[tokio::test]
async fn test_daily_sweep_report() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "C1", Some("AGENT1"));
    seed_job(&state, "J1", "C1", Some("R1"), None, ServicePackage::FullService);
    seed_subscription(&state, "SUB1", "C1", date(2025, 1, 1));
    seed_licensee(&state, "L1", 10, Some(date(2026, 1, 10)));

    state
        .payment_events
        .handle_job_paid(
            &JobPaidEvent {
                job_id: "J1".to_string(),
                company_id: "C1".to_string(),
                service_package: ServicePackage::FullService,
                amount_paid: money(990, 0),
                subscription_id: Some("SUB1".to_string()),
            },
            ts(2025, 1, 15),
        )
        .await
        .unwrap();

    let report = state.sweeps.run_daily(ts(2025, 12, 26)).await;
    assert_eq!(report.status_code(), 0);
    // CONFIRMED 的销售佣金不参与过期
    assert_eq!(report.expiry.total_expired(), 0);
    assert_eq!(report.renewal_opportunities.len(), 1);
    assert_eq!(report.renewal_opportunities[0].agent_id, "AGENT1");
    assert_eq!(report.compliance_alerts.len(), 1);
    assert_eq!(
        report.compliance_summary.as_ref().map(|s| s.total),
        Some(1)
    );

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["expiry"]["errors"].as_array().unwrap().is_empty());
    assert_eq!(json["renewal_opportunities"][0]["company_id"], "C1");

    let commissions = state.repos.commissions.list_by_consultant("AGENT1").unwrap();
    assert_eq!(commissions[0].status, CommissionStatus::Confirmed);
}

#[tokio::test]
async fn test_bad_config_is_reported_not_raised() {
    let (_tmp, state) = create_test_state();
    state
        .config
        .set_global_config_value(config_keys::INACTIVE_REGION_DAYS, "sixty")
        .unwrap();

    let report = state.sweeps.run_daily(ts(2026, 1, 1)).await;
    assert_eq!(report.status_code(), 1);
    assert_eq!(report.step_errors.len(), 1);
    assert!(report.step_errors[0].starts_with("compliance scan"));
    assert!(report.compliance_summary.is_none());
}

#[tokio::test]
async fn test_oversized_day_counts_are_reported_not_raised() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "C1", Some("AGENT1"));
    state
        .attribution
        .lock_attribution("C1", ts(2025, 9, 1))
        .unwrap();
    state
        .config
        .set_global_config_value(config_keys::INACTIVE_REGION_DAYS, "9223372036854775807")
        .unwrap();
    state
        .config
        .set_global_config_value(config_keys::RENEWAL_WINDOW_DAYS, "36501")
        .unwrap();

    let report = state.sweeps.run_daily(ts(2026, 6, 1)).await;
    assert_eq!(report.status_code(), 1);
    assert_eq!(report.step_errors.len(), 2);
    assert!(report.step_errors[0].starts_with("compliance scan"));
    assert!(report.step_errors[1].starts_with("renewal scan"));
    assert!(report.renewal_opportunities.is_empty());
}

#[tokio::test]
async fn test_explicit_renewal_window_out_of_range() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "C1", Some("AGENT1"));
    state
        .attribution
        .lock_attribution("C1", ts(2025, 9, 1))
        .unwrap();

    let err = state
        .attribution
        .find_renewal_opportunities(Some(i64::MAX), ts(2026, 6, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AttributionError::WindowOutOfRange(_)));
}
