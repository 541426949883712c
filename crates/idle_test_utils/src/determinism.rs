//! Determinism test harness.
//!
//! Runs the same operation script against two independently constructed
//! sessions and asserts their ledger state hashes agree. Any hidden source
//! of nondeterminism (map iteration order, uninitialised state, wall-clock
//! leakage) shows up as a hash divergence.

use idle_core::catalog::{BuildingId, ResourceId, UpgradeId};
use idle_core::session::GameSession;

/// One scripted host operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Advance one tick.
    Tick,
    /// Attempt a building purchase (refusals are part of the script).
    BuyBuilding(String),
    /// Attempt an upgrade purchase (refusals are part of the script).
    BuyUpgrade(String),
    /// Manually collect a resource.
    Collect {
        /// Resource id to collect into.
        resource: String,
        /// Amount collected.
        amount: f64,
    },
}

/// Apply one operation to a session, ignoring purchase refusals.
pub fn apply_op(session: &mut GameSession, op: &Op) {
    match op {
        Op::Tick => {
            session.tick();
        }
        Op::BuyBuilding(id) => {
            let _ = session.purchase_building(&BuildingId::new(id.as_str()));
        }
        Op::BuyUpgrade(id) => {
            let _ = session.purchase_upgrade(&UpgradeId::new(id.as_str()));
        }
        Op::Collect { resource, amount } => {
            session.collect_manually(&ResourceId::new(resource.as_str()), *amount);
        }
    }
}

/// Run an operation script to completion.
pub fn run_ops(session: &mut GameSession, ops: &[Op]) {
    for op in ops {
        apply_op(session, op);
    }
}

/// Assert that a script produces identical state on two fresh sessions.
///
/// # Panics
///
/// Panics with the diverging hashes if the two runs disagree.
pub fn assert_deterministic(make_session: impl Fn() -> GameSession, ops: &[Op]) {
    let mut first = make_session();
    let mut second = make_session();

    run_ops(&mut first, ops);
    run_ops(&mut second, ops);

    let first_hash = first.ledger().state_hash();
    let second_hash = second.ledger().state_hash();
    assert_eq!(
        first_hash, second_hash,
        "same script produced diverging ledgers ({first_hash:#x} vs {second_hash:#x})"
    );
}
