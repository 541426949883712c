//! The ledger: all mutable economic state.
//!
//! The ledger is owned exclusively by the simulation core. Collaborators
//! (UI, host) only ever see a [`LedgerSnapshot`] taken after a tick or
//! transaction; nothing outside the core holds a mutable reference.
//!
//! Every mutation path runs through the clamping helpers, so the public
//! invariants hold at all times:
//! - resource quantities are finite and `>= 0`
//! - percentage resources stay within `[0, 100]`
//! - statistics never decrease except through an explicit reset
//! - NaN never survives a mutation

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::catalog::{
    well_known, AchievementId, BuildingId, Catalog, ResourceId, ResourceKind, UpgradeId,
};

/// Round a quantity to the two decimal places resources are kept at.
///
/// Applied once per resource per tick to bound floating-point drift.
#[must_use]
pub fn round_quantity(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Monotonically non-decreasing lifetime counters.
///
/// Counters are never decremented except by an explicit reset, which
/// replaces the whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Manual collections performed.
    #[serde(default)]
    pub total_clicks: u64,
    /// Coins ever earned, including ones later spent.
    #[serde(default)]
    pub total_coins_earned: f64,
    /// Buildings ever purchased.
    #[serde(default)]
    pub buildings_purchased: u64,
    /// Simulated seconds elapsed.
    #[serde(default)]
    pub game_seconds: f64,
}

impl Statistics {
    /// Replace non-finite or negative values with zero.
    pub(crate) fn sanitize(&mut self) {
        if !self.total_coins_earned.is_finite() || self.total_coins_earned < 0.0 {
            self.total_coins_earned = 0.0;
        }
        if !self.game_seconds.is_finite() || self.game_seconds < 0.0 {
            self.game_seconds = 0.0;
        }
    }
}

/// Achievement set as it appears in the persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnlockedAchievements {
    /// Ids of unlocked achievements. Order is not significant.
    #[serde(default)]
    pub unlocked: Vec<AchievementId>,
}

/// Read-only projection of the ledger for the host UI and for persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Resource quantities.
    #[serde(default)]
    pub resources: BTreeMap<ResourceId, f64>,
    /// Owned building counts.
    #[serde(default)]
    pub buildings: BTreeMap<BuildingId, u64>,
    /// Upgrade levels.
    #[serde(default)]
    pub upgrades: BTreeMap<UpgradeId, u32>,
    /// Lifetime counters.
    #[serde(default)]
    pub statistics: Statistics,
    /// Unlocked achievements.
    #[serde(default)]
    pub achievements: UnlockedAchievements,
}

impl LedgerSnapshot {
    /// Number of unlocked achievements.
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.achievements.unlocked.len()
    }
}

/// The mutable economic state: resources, buildings, upgrades, statistics
/// and unlocked achievements.
#[derive(Debug, Clone)]
pub struct Ledger {
    resources: BTreeMap<ResourceId, f64>,
    buildings: BTreeMap<BuildingId, u64>,
    upgrades: BTreeMap<UpgradeId, u32>,
    statistics: Statistics,
    achievements: BTreeSet<AchievementId>,
    /// Resource ids subject to the `[0, 100]` clamp, copied from the catalog.
    percentage: BTreeSet<ResourceId>,
}

impl Ledger {
    /// Create a fresh ledger with catalog-driven defaults.
    ///
    /// Every known resource starts at its catalog initial value; every known
    /// building and upgrade starts at zero.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut resources = BTreeMap::new();
        let mut percentage = BTreeSet::new();
        for def in catalog.resources() {
            resources.insert(def.id.clone(), def.initial);
            if def.kind == ResourceKind::Percentage {
                percentage.insert(def.id.clone());
            }
        }
        let buildings = catalog
            .buildings()
            .iter()
            .map(|d| (d.id.clone(), 0))
            .collect();
        let upgrades = catalog
            .upgrades()
            .iter()
            .map(|d| (d.id.clone(), 0))
            .collect();

        Self {
            resources,
            buildings,
            upgrades,
            statistics: Statistics::default(),
            achievements: BTreeSet::new(),
            percentage,
        }
    }

    /// Current quantity of a resource (zero for unknown ids).
    #[must_use]
    pub fn resource(&self, id: &ResourceId) -> f64 {
        self.resources.get(id).copied().unwrap_or(0.0)
    }

    /// Current quantity of a resource, by bare name.
    #[must_use]
    pub fn resource_named(&self, id: &str) -> f64 {
        self.resources.get(id).copied().unwrap_or(0.0)
    }

    /// Owned count of a building (zero for unknown ids).
    #[must_use]
    pub fn building_count(&self, id: &BuildingId) -> u64 {
        self.buildings.get(id).copied().unwrap_or(0)
    }

    /// Current level of an upgrade (zero for unknown ids).
    #[must_use]
    pub fn upgrade_level(&self, id: &UpgradeId) -> u32 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }

    /// Lifetime counters.
    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Unlocked achievement ids.
    #[must_use]
    pub fn achievements(&self) -> &BTreeSet<AchievementId> {
        &self.achievements
    }

    /// Whether an achievement has been unlocked.
    #[must_use]
    pub fn is_unlocked(&self, id: &AchievementId) -> bool {
        self.achievements.contains(id)
    }

    /// Clamp a candidate value into this resource's legal range.
    ///
    /// Non-finite values collapse to zero so NaN can never persist.
    fn clamp_value(&self, id: &ResourceId, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        let floored = value.max(0.0);
        if self.percentage.contains(id) {
            floored.min(100.0)
        } else {
            floored
        }
    }

    /// Set a resource to an absolute value, clamped.
    pub(crate) fn set_resource(&mut self, id: &ResourceId, value: f64) {
        let clamped = self.clamp_value(id, value);
        self.resources.insert(id.clone(), clamped);
    }

    /// Add a (possibly negative) delta to a resource, clamped.
    ///
    /// Returns the change actually applied after clamping.
    pub(crate) fn credit(&mut self, id: &ResourceId, delta: f64) -> f64 {
        let before = self.resource(id);
        self.set_resource(id, before + delta);
        self.resource(id) - before
    }

    /// Credit a resource and record coin income in the statistics.
    ///
    /// Returns the change actually applied after clamping.
    pub(crate) fn earn(&mut self, id: &ResourceId, delta: f64) -> f64 {
        let applied = self.credit(id, delta);
        if id.as_str() == well_known::COINS && delta > 0.0 && delta.is_finite() {
            self.statistics.total_coins_earned += delta;
        }
        applied
    }

    /// Spend from a resource if the full amount is available.
    ///
    /// Returns true if the transaction succeeded; the ledger is unchanged
    /// on failure.
    pub(crate) fn try_spend(&mut self, id: &ResourceId, amount: f64) -> bool {
        if self.resource(id) >= amount {
            self.credit(id, -amount);
            true
        } else {
            false
        }
    }

    /// Round a resource to the per-tick precision.
    pub(crate) fn round_resource(&mut self, id: &ResourceId) {
        let rounded = round_quantity(self.resource(id));
        self.set_resource(id, rounded);
    }

    /// Set an owned-building count directly (persistence restore path).
    pub(crate) fn set_building_count(&mut self, id: &BuildingId, count: u64) {
        self.buildings.insert(id.clone(), count);
    }

    /// Increment an owned-building count.
    pub(crate) fn add_building(&mut self, id: &BuildingId) -> u64 {
        let count = self.buildings.entry(id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Set an upgrade level directly (persistence restore path).
    pub(crate) fn set_upgrade_level(&mut self, id: &UpgradeId, level: u32) {
        self.upgrades.insert(id.clone(), level);
    }

    /// Increment an upgrade level.
    pub(crate) fn raise_upgrade_level(&mut self, id: &UpgradeId) -> u32 {
        let level = self.upgrades.entry(id.clone()).or_insert(0);
        *level = level.saturating_add(1);
        *level
    }

    /// Mutable access to the lifetime counters.
    pub(crate) fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.statistics
    }

    /// Replace the lifetime counters (persistence restore path).
    pub(crate) fn set_statistics(&mut self, mut statistics: Statistics) {
        statistics.sanitize();
        self.statistics = statistics;
    }

    /// Record an achievement as unlocked.
    ///
    /// Returns false if it was already unlocked (the transition is one-way).
    pub(crate) fn unlock_achievement(&mut self, id: AchievementId) -> bool {
        self.achievements.insert(id)
    }

    /// Take a read-only snapshot for the host UI or for persistence.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            resources: self.resources.clone(),
            buildings: self.buildings.clone(),
            upgrades: self.upgrades.clone(),
            statistics: self.statistics.clone(),
            achievements: UnlockedAchievements {
                unlocked: self.achievements.iter().cloned().collect(),
            },
        }
    }

    /// Calculate a hash of the current ledger state.
    ///
    /// Two ledgers that went through the same operation sequence produce
    /// identical hashes; used by the determinism test harness and logged
    /// per tick under debug assertions.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.resources.len().hash(&mut hasher);
        for (id, value) in &self.resources {
            id.hash(&mut hasher);
            value.to_bits().hash(&mut hasher);
        }

        self.buildings.len().hash(&mut hasher);
        for (id, count) in &self.buildings {
            id.hash(&mut hasher);
            count.hash(&mut hasher);
        }

        self.upgrades.len().hash(&mut hasher);
        for (id, level) in &self.upgrades {
            id.hash(&mut hasher);
            level.hash(&mut hasher);
        }

        self.statistics.total_clicks.hash(&mut hasher);
        self.statistics.total_coins_earned.to_bits().hash(&mut hasher);
        self.statistics.buildings_purchased.hash(&mut hasher);
        self.statistics.game_seconds.to_bits().hash(&mut hasher);

        self.achievements.len().hash(&mut hasher);
        for id in &self.achievements {
            id.hash(&mut hasher);
        }

        hasher.finish()
    }
}
