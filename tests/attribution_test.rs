// ==========================================
// 销售归属锁定 集成测试
// ==========================================
// 测试目标: 归属变更/锁定/转移在真实 SQLite 上的行为与并发安全
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use chrono::Months;
use hrm8_sales_engine::domain::entity_types;
use hrm8_sales_engine::engine::AttributionError;
use test_helpers::{create_test_state, seed_company, ts};

#[test]
fn test_unlocked_company_can_change_agent() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "C1", Some("AGENT1"));

    let company = state
        .attribution
        .assign_agent("C1", "AGENT2", ts(2025, 6, 1))
        .unwrap();
    assert_eq!(company.referred_by.as_deref(), Some("AGENT2"));
    assert!(!company.attribution_locked);
}

#[test]
fn test_locked_company_rejects_other_agent() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "C1", Some("AGENT1"));
    let locked_at = ts(2025, 3, 1);
    state.attribution.lock_attribution("C1", locked_at).unwrap();

    let now = locked_at + Months::new(3);
    let err = state
        .attribution
        .assign_agent("C1", "AGENT2", now)
        .unwrap_err();
    assert!(matches!(err, AttributionError::Locked { .. }));
    assert!(err.to_string().contains("AGENT1"));

    let company = state.repos.companies.find_by_id("C1").unwrap().unwrap();
    assert_eq!(company.referred_by.as_deref(), Some("AGENT1"));
    assert!(state
        .attribution
        .has_valid_attribution("C1", "AGENT1", now)
        .unwrap());
    assert!(!state
        .attribution
        .has_valid_attribution("C1", "AGENT2", now)
        .unwrap());
}

#[test]
fn test_lock_window_closes_after_twelve_months() {
    let (_tmp, state) = create_test_state();
    let company = seed_company(&state, "C1", Some("AGENT1"));
    let locked_at = ts(2025, 3, 1);
    state.attribution.lock_attribution("C1", locked_at).unwrap();

    let company = state.repos.companies.find_by_id(&company.id).unwrap().unwrap();
    assert_eq!(
        state.attribution.locked_until(&company),
        Some(ts(2026, 3, 1))
    );
    assert!(state.attribution.is_locked(&company, ts(2026, 2, 28)));
    assert!(!state.attribution.is_locked(&company, ts(2026, 3, 1)));

    let reassigned = state
        .attribution
        .assign_agent("C1", "AGENT2", ts(2026, 3, 2))
        .unwrap();
    assert_eq!(reassigned.referred_by.as_deref(), Some("AGENT2"));
}

#[test]
fn test_concurrent_locks_keep_single_timestamp() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "C1", Some("AGENT1"));

    let outcomes: Vec<bool> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|day| {
                let attribution = state.attribution.clone();
                s.spawn(move || {
                    attribution
                        .lock_attribution("C1", ts(2025, 5, day))
                        .map(|o| o.newly_locked())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|newly| **newly).count(), 1);
    let company = state.repos.companies.find_by_id("C1").unwrap().unwrap();
    assert!(company.attribution_locked);
    assert!(company.attribution_locked_at.is_some());
}

#[test]
fn test_transfer_overrides_lock_and_is_audited() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "C1", Some("AGENT1"));
    state.attribution.lock_attribution("C1", ts(2025, 3, 1)).unwrap();

    let moved = state
        .attribution
        .transfer_attribution("C1", "AGENT3", "sales-admin", ts(2025, 4, 1))
        .unwrap();
    assert_eq!(moved.referred_by.as_deref(), Some("AGENT3"));

    let trail = state
        .repos
        .audit
        .list_for_entity(entity_types::COMPANY, "C1")
        .unwrap();
    assert!(trail.iter().any(|e| e.performed_by == "sales-admin"));
}

#[tokio::test]
async fn test_renewal_opportunities_use_configured_window() {
    let (_tmp, state) = create_test_state();
    seed_company(&state, "SOON", Some("AGENT1"));
    seed_company(&state, "LATER", Some("AGENT2"));
    state.attribution.lock_attribution("SOON", ts(2025, 1, 20)).unwrap();
    state.attribution.lock_attribution("LATER", ts(2025, 6, 1)).unwrap();

    let found = state
        .attribution
        .find_renewal_opportunities(None, ts(2026, 1, 1))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].company_id, "SOON");
    assert_eq!(found[0].days_remaining, 19);
}
