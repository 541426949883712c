//! Achievement evaluation and one-shot rewards.
//!
//! Each achievement is a one-way state machine: `Locked -> Unlocked`,
//! terminal. A sweep evaluates every still-locked achievement's condition
//! against the ledger; on the first `true` the achievement unlocks, its
//! reward is applied additively exactly once, and its id is reported so the
//! host can display the unlock. Sweeping an unlocked achievement is a no-op,
//! so repeated sweeps and save/load cycles can never double-apply a reward.

use crate::catalog::{AchievementId, Catalog};
use crate::ledger::Ledger;

/// Evaluate all still-locked achievements, applying rewards for new unlocks.
///
/// Returns the newly unlocked ids in catalog declaration order.
pub fn sweep(ledger: &mut Ledger, catalog: &Catalog) -> Vec<AchievementId> {
    let mut unlocked = Vec::new();

    for def in catalog.achievements() {
        if ledger.is_unlocked(&def.id) {
            continue;
        }
        if !def.condition.eval(ledger) {
            continue;
        }
        // Record the unlock before paying out, so a reward that itself
        // satisfies this condition cannot re-trigger it.
        if !ledger.unlock_achievement(def.id.clone()) {
            continue;
        }
        for reward in &def.reward {
            ledger.earn(&reward.resource, reward.amount);
            ledger.round_resource(&reward.resource);
        }
        unlocked.push(def.id.clone());
    }

    unlocked
}

/// Progress toward an achievement in `[0, 1]`.
///
/// Unlocked achievements report exactly 1. Returns `None` for unknown ids.
#[must_use]
pub fn progress(ledger: &Ledger, catalog: &Catalog, id: &AchievementId) -> Option<f64> {
    let def = catalog.achievement(id)?;
    if ledger.is_unlocked(id) {
        return Some(1.0);
    }
    Some(def.condition.progress(ledger))
}
