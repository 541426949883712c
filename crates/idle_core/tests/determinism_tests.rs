//! Determinism: identical operation scripts produce identical ledgers.

use idle_core::catalog::Catalog;
use idle_core::session::{GameSession, ManualClock};
use idle_test_utils::determinism::{assert_deterministic, run_ops, Op};
use idle_test_utils::fixtures::{standard_session, tiny_catalog};
use idle_test_utils::proptest::prelude::*;
use idle_test_utils::strategies::ops_strategy;

#[test]
fn test_fixed_script_is_deterministic() {
    let ops = vec![
        Op::Collect {
            resource: "coins".to_string(),
            amount: 500.0,
        },
        Op::BuyBuilding("cottage".to_string()),
        Op::BuyBuilding("cottage".to_string()),
        Op::Tick,
        Op::Tick,
        Op::BuyBuilding("market".to_string()),
        Op::Collect {
            resource: "population".to_string(),
            amount: 12.0,
        },
        Op::BuyUpgrade("trade_routes".to_string()),
        Op::Tick,
        Op::BuyBuilding("factory".to_string()),
        Op::Tick,
        Op::Tick,
    ];
    assert_deterministic(standard_session, &ops);
}

#[test]
fn test_refused_purchases_do_not_diverge() {
    // Refusals must be as deterministic as successes.
    let ops = vec![
        Op::BuyBuilding("factory".to_string()), // locked
        Op::BuyBuilding("nonexistent".to_string()),
        Op::Tick,
        Op::BuyUpgrade("city_charter".to_string()), // unaffordable
        Op::Tick,
    ];
    assert_deterministic(standard_session, &ops);
}

#[test]
fn test_long_run_state_hash_stable() {
    let mut ops = vec![Op::Collect {
        resource: "coins".to_string(),
        amount: 10_000.0,
    }];
    for i in 0..300 {
        if i % 7 == 0 {
            ops.push(Op::BuyBuilding("cottage".to_string()));
        }
        ops.push(Op::Tick);
    }

    let mut reference = standard_session();
    run_ops(&mut reference, &ops);
    let expected = reference.ledger().state_hash();

    for _ in 0..3 {
        let mut session = standard_session();
        run_ops(&mut session, &ops);
        assert_eq!(session.ledger().state_hash(), expected);
    }
}

#[test]
fn test_custom_catalog_scripts_deterministic() {
    let ops = vec![
        Op::BuyBuilding("hut".to_string()),
        Op::Tick,
        Op::Collect {
            resource: "population".to_string(),
            amount: 3.0,
        },
        Op::BuyBuilding("stall".to_string()),
        Op::Tick,
        Op::Tick,
    ];
    assert_deterministic(
        || GameSession::new(tiny_catalog(), Box::new(ManualClock::at(0))),
        &ops,
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_any_script_is_deterministic(ops in ops_strategy(&Catalog::standard(), 40)) {
        assert_deterministic(standard_session, &ops);
    }
}
