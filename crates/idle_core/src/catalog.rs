//! Static catalog of resource, building, upgrade and achievement definitions.
//!
//! The catalog is pure data: cost curve parameters, production parameters and
//! unlock predicates, loaded once at startup and never mutated. All dynamic
//! state lives in the [`Ledger`](crate::ledger::Ledger). Entries are kept in
//! declaration order and enumerated through the registry's own iteration
//! methods, so no caller depends on map iteration order.
//!
//! Catalogs can be loaded from RON files (see [`Catalog::from_ron_str`]) or
//! taken from the compiled-in [`Catalog::standard`] set.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::ledger::{Ledger, Statistics};

/// Resource ids the built-in gating and statistics rules are keyed on.
///
/// A catalog may define any resources it likes, but these four have
/// engine-level meaning: population and happiness drive output gating, and
/// coins feed the `total_coins_earned` statistic.
pub mod well_known {
    /// The primary currency.
    pub const COINS: &str = "coins";
    /// Inhabitants; gates commercial and industrial output.
    pub const POPULATION: &str = "population";
    /// Percentage-style morale resource; gates research output.
    pub const HAPPINESS: &str = "happiness";
    /// Science currency produced by research buildings.
    pub const RESEARCH: &str = "research";
}

/// Unique identifier for resource types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

/// Unique identifier for building types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(String);

/// Unique identifier for upgrade types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(String);

/// Unique identifier for achievements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementId(String);

macro_rules! id_impls {
    ($ty:ident) => {
        impl $ty {
            /// Create a new id.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

id_impls!(ResourceId);
id_impls!(BuildingId);
id_impls!(UpgradeId);
id_impls!(AchievementId);

/// How a resource's value is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Floored at zero, unbounded above.
    #[default]
    Standard,
    /// Percentage-style: clamped to `[0, 100]`.
    Percentage,
}

/// Definition of a resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Unique string identifier.
    pub id: ResourceId,
    /// Display name for the host UI.
    pub display_name: String,
    /// Bounding rule applied after every mutation.
    #[serde(default)]
    pub kind: ResourceKind,
    /// Starting quantity for a fresh ledger.
    #[serde(default)]
    pub initial: f64,
}

impl ResourceDef {
    /// Create a standard resource definition.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(id),
            display_name: display_name.into(),
            kind: ResourceKind::Standard,
            initial: 0.0,
        }
    }

    /// Mark this resource as percentage-style.
    #[must_use]
    pub fn percentage(mut self) -> Self {
        self.kind = ResourceKind::Percentage;
        self
    }

    /// Set the starting quantity.
    #[must_use]
    pub fn with_initial(mut self, initial: f64) -> Self {
        self.initial = initial;
        self
    }
}

/// Building categories, driving gating rules and upgrade multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Produces population; never gated.
    Residential,
    /// Produces coins; requires population >= 1.
    Commercial,
    /// Produces coins at scale; requires population >= 10.
    Industrial,
    /// Produces research; requires happiness >= 50.
    Research,
    /// Produces happiness; never gated.
    Leisure,
}

impl Category {
    /// All categories, in a fixed order.
    pub const ALL: [Category; 5] = [
        Category::Residential,
        Category::Commercial,
        Category::Industrial,
        Category::Research,
        Category::Leisure,
    ];
}

/// What an unlock threshold is measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnlockSubject {
    /// A resource quantity.
    Resource(ResourceId),
    /// An owned-building count.
    Building(BuildingId),
}

impl fmt::Display for UnlockSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockSubject::Resource(id) => write!(f, "resource `{id}`"),
            UnlockSubject::Building(id) => write!(f, "building `{id}`"),
        }
    }
}

/// A single minimum-value requirement in an unlock condition.
///
/// Thresholds are evaluated in declaration order and the first unmet one is
/// reported, which keeps refusal messages deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// What is measured.
    pub subject: UnlockSubject,
    /// The minimum value that must be met.
    pub minimum: f64,
}

impl Threshold {
    /// Require a resource quantity.
    #[must_use]
    pub fn resource(id: impl Into<String>, minimum: f64) -> Self {
        Self {
            subject: UnlockSubject::Resource(ResourceId::new(id)),
            minimum,
        }
    }

    /// Require an owned-building count.
    #[must_use]
    pub fn building(id: impl Into<String>, minimum: f64) -> Self {
        Self {
            subject: UnlockSubject::Building(BuildingId::new(id)),
            minimum,
        }
    }
}

fn default_tier() -> u8 {
    1
}

fn default_cost_resource() -> ResourceId {
    ResourceId::new(well_known::COINS)
}

/// Data-driven building definition.
///
/// # Example RON
///
/// ```ron
/// BuildingDef(
///     id: "market",
///     display_name: "Market",
///     base_cost: 25.0,
///     cost_multiplier: 1.15,
///     base_production: 1.0,
///     output_resource: "coins",
///     category: Commercial,
///     unlock_condition: [(subject: Building("cottage"), minimum: 1.0)],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDef {
    /// Unique string identifier for this building type.
    pub id: BuildingId,
    /// Display name for the host UI.
    pub display_name: String,
    /// Cost of the first instance.
    pub base_cost: f64,
    /// Per-purchase cost growth factor; must be greater than 1.
    pub cost_multiplier: f64,
    /// Output per owned instance per second, before multipliers.
    pub base_production: f64,
    /// The resource this building produces.
    pub output_resource: ResourceId,
    /// The resource purchases are paid in.
    #[serde(default = "default_cost_resource")]
    pub cost_resource: ResourceId,
    /// Category, driving gating and upgrade multipliers.
    pub category: Category,
    /// Progression tier (1 = available from the start).
    #[serde(default = "default_tier")]
    pub tier: u8,
    /// Minimum thresholds that must all be met before purchase.
    #[serde(default)]
    pub unlock_condition: Vec<Threshold>,
    /// The building this one eventually upgrades into, if any.
    #[serde(default)]
    pub upgrades_to: Option<BuildingId>,
}

impl BuildingDef {
    /// Create a building definition with no unlock requirements.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_cost: f64,
        cost_multiplier: f64,
        base_production: f64,
        output_resource: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: BuildingId::new(id),
            display_name: display_name.into(),
            base_cost,
            cost_multiplier,
            base_production,
            output_resource: ResourceId::new(output_resource),
            cost_resource: default_cost_resource(),
            category,
            tier: 1,
            unlock_condition: Vec::new(),
            upgrades_to: None,
        }
    }

    /// Set the unlock thresholds.
    #[must_use]
    pub fn with_unlock(mut self, thresholds: Vec<Threshold>) -> Self {
        self.unlock_condition = thresholds;
        self
    }

    /// Set the progression tier.
    #[must_use]
    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    /// Set the building this one upgrades into.
    #[must_use]
    pub fn with_upgrades_to(mut self, id: impl Into<String>) -> Self {
        self.upgrades_to = Some(BuildingId::new(id));
        self
    }

    /// Pay purchases in a resource other than coins.
    #[must_use]
    pub fn with_cost_resource(mut self, id: impl Into<String>) -> Self {
        self.cost_resource = ResourceId::new(id);
        self
    }
}

/// What buying levels of an upgrade does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum UpgradeEffect {
    /// Scales the output of every building in the upgrade's category by
    /// `1 + level * per_level_effect`.
    #[default]
    CategoryMultiplier,
    /// Adds `level * per_level_effect` per second to a resource, independent
    /// of building output.
    FlatRate {
        /// The resource receiving the flat bonus.
        resource: ResourceId,
    },
}

/// Data-driven upgrade definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeDef {
    /// Unique string identifier for this upgrade type.
    pub id: UpgradeId,
    /// Display name for the host UI.
    pub display_name: String,
    /// Cost of the first level.
    pub base_cost: f64,
    /// Per-level cost growth factor; must be greater than 1.
    pub cost_multiplier: f64,
    /// Terminal level; purchases beyond it are refused.
    pub max_level: u32,
    /// Effect magnitude contributed by each level.
    pub per_level_effect: f64,
    /// The resource levels are paid in.
    #[serde(default = "default_cost_resource")]
    pub cost_resource: ResourceId,
    /// Category this upgrade applies to.
    pub category: Category,
    /// What each level does.
    #[serde(default)]
    pub effect: UpgradeEffect,
}

impl UpgradeDef {
    /// Create a category-multiplier upgrade definition.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_cost: f64,
        cost_multiplier: f64,
        max_level: u32,
        per_level_effect: f64,
        category: Category,
    ) -> Self {
        Self {
            id: UpgradeId::new(id),
            display_name: display_name.into(),
            base_cost,
            cost_multiplier,
            max_level,
            per_level_effect,
            cost_resource: default_cost_resource(),
            category,
            effect: UpgradeEffect::CategoryMultiplier,
        }
    }

    /// Make this a flat per-second bonus to a resource.
    #[must_use]
    pub fn with_flat_rate(mut self, resource: impl Into<String>) -> Self {
        self.effect = UpgradeEffect::FlatRate {
            resource: ResourceId::new(resource),
        };
        self
    }

    /// Pay levels in a resource other than coins.
    #[must_use]
    pub fn with_cost_resource(mut self, id: impl Into<String>) -> Self {
        self.cost_resource = ResourceId::new(id);
        self
    }
}

/// Ledger statistics an achievement condition can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKind {
    /// Manual collections performed.
    TotalClicks,
    /// Coins ever earned, including spent ones.
    TotalCoinsEarned,
    /// Buildings ever purchased.
    BuildingsPurchased,
    /// Simulated seconds elapsed.
    GameSeconds,
}

impl StatKind {
    /// Read this statistic's current value.
    #[must_use]
    pub fn value(self, stats: &Statistics) -> f64 {
        match self {
            StatKind::TotalClicks => stats.total_clicks as f64,
            StatKind::TotalCoinsEarned => stats.total_coins_earned,
            StatKind::BuildingsPurchased => stats.buildings_purchased as f64,
            StatKind::GameSeconds => stats.game_seconds,
        }
    }
}

/// A pure, typed achievement predicate over the ledger.
///
/// Conditions carry their numeric targets as data, so unlock progress is
/// computed from the same definition the predicate evaluates - there is no
/// introspection of predicate source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// A resource quantity has reached a minimum.
    ResourceAtLeast {
        /// The resource measured.
        resource: ResourceId,
        /// The target quantity.
        minimum: f64,
    },
    /// An owned-building count has reached a minimum.
    BuildingCountAtLeast {
        /// The building counted.
        building: BuildingId,
        /// The target count.
        minimum: u64,
    },
    /// An upgrade level has reached a minimum.
    UpgradeLevelAtLeast {
        /// The upgrade measured.
        upgrade: UpgradeId,
        /// The target level.
        minimum: u32,
    },
    /// A cumulative statistic has reached a minimum.
    StatAtLeast {
        /// The statistic measured.
        stat: StatKind,
        /// The target value.
        minimum: f64,
    },
    /// Every nested condition holds.
    All(Vec<Condition>),
}

impl Condition {
    /// Evaluate the predicate against the ledger. Pure; no side effects.
    #[must_use]
    pub fn eval(&self, ledger: &Ledger) -> bool {
        match self {
            Condition::ResourceAtLeast { resource, minimum } => {
                ledger.resource(resource) >= *minimum
            }
            Condition::BuildingCountAtLeast { building, minimum } => {
                ledger.building_count(building) >= *minimum
            }
            Condition::UpgradeLevelAtLeast { upgrade, minimum } => {
                ledger.upgrade_level(upgrade) >= *minimum
            }
            Condition::StatAtLeast { stat, minimum } => {
                stat.value(ledger.statistics()) >= *minimum
            }
            Condition::All(conditions) => conditions.iter().all(|c| c.eval(ledger)),
        }
    }

    /// Progress toward the predicate in `[0, 1]`.
    ///
    /// For [`Condition::All`] this is the least-complete nested condition.
    #[must_use]
    pub fn progress(&self, ledger: &Ledger) -> f64 {
        fn ratio(current: f64, minimum: f64) -> f64 {
            if minimum <= 0.0 {
                1.0
            } else {
                (current / minimum).clamp(0.0, 1.0)
            }
        }

        match self {
            Condition::ResourceAtLeast { resource, minimum } => {
                ratio(ledger.resource(resource), *minimum)
            }
            Condition::BuildingCountAtLeast { building, minimum } => {
                ratio(ledger.building_count(building) as f64, *minimum as f64)
            }
            Condition::UpgradeLevelAtLeast { upgrade, minimum } => {
                ratio(f64::from(ledger.upgrade_level(upgrade)), f64::from(*minimum))
            }
            Condition::StatAtLeast { stat, minimum } => {
                ratio(stat.value(ledger.statistics()), *minimum)
            }
            Condition::All(conditions) => conditions
                .iter()
                .map(|c| c.progress(ledger))
                .fold(1.0, f64::min),
        }
    }
}

/// A one-shot resource grant applied when an achievement unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// The resource granted.
    pub resource: ResourceId,
    /// The amount granted.
    pub amount: f64,
}

/// Data-driven achievement definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Unique string identifier for this achievement.
    pub id: AchievementId,
    /// Display name for the host UI.
    pub display_name: String,
    /// The unlock predicate.
    pub condition: Condition,
    /// Rewards applied additively, exactly once, on unlock.
    #[serde(default)]
    pub reward: Vec<Reward>,
    /// Free-form grouping label for the host UI.
    #[serde(default)]
    pub category: String,
}

impl AchievementDef {
    /// Create an achievement definition with no rewards.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        condition: Condition,
    ) -> Self {
        Self {
            id: AchievementId::new(id),
            display_name: display_name.into(),
            condition,
            reward: Vec::new(),
            category: String::new(),
        }
    }

    /// Add a reward grant.
    #[must_use]
    pub fn with_reward(mut self, resource: impl Into<String>, amount: f64) -> Self {
        self.reward.push(Reward {
            resource: ResourceId::new(resource),
            amount,
        });
        self
    }

    /// Set the grouping label.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// Serializable catalog contents, as loaded from a RON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Resource definitions.
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    /// Building definitions.
    #[serde(default)]
    pub buildings: Vec<BuildingDef>,
    /// Upgrade definitions.
    #[serde(default)]
    pub upgrades: Vec<UpgradeDef>,
    /// Achievement definitions.
    #[serde(default)]
    pub achievements: Vec<AchievementDef>,
}

/// Validated, indexed catalog registry.
///
/// Construction validates every definition (see [`Catalog::new`]); once
/// built, the catalog is immutable. Enumeration methods yield entries in
/// declaration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    resources: Vec<ResourceDef>,
    buildings: Vec<BuildingDef>,
    upgrades: Vec<UpgradeDef>,
    achievements: Vec<AchievementDef>,
    resource_index: HashMap<ResourceId, usize>,
    building_index: HashMap<BuildingId, usize>,
    upgrade_index: HashMap<UpgradeId, usize>,
    achievement_index: HashMap<AchievementId, usize>,
}

impl Catalog {
    /// Build and validate a catalog from raw definitions.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate ids, cost multipliers not greater
    /// than 1, base costs below 1, negative production, dangling id
    /// references, upgrade-path cycles, or percentage resources with an
    /// initial value outside `[0, 100]`.
    pub fn new(data: CatalogData) -> Result<Self> {
        let CatalogData {
            resources,
            buildings,
            upgrades,
            achievements,
        } = data;

        let resource_index = build_index(&resources, "resource", |d| d.id.clone())?;
        let building_index = build_index(&buildings, "building", |d| d.id.clone())?;
        let upgrade_index = build_index(&upgrades, "upgrade", |d| d.id.clone())?;
        let achievement_index = build_index(&achievements, "achievement", |d| d.id.clone())?;

        let catalog = Self {
            resources,
            buildings,
            upgrades,
            achievements,
            resource_index,
            building_index,
            upgrade_index,
            achievement_index,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from RON source text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CatalogParse`] for syntax errors, or any
    /// validation error from [`Catalog::new`].
    pub fn from_ron_str(src: &str) -> Result<Self> {
        let data: CatalogData =
            ron::from_str(src).map_err(|e| GameError::CatalogParse(e.to_string()))?;
        Self::new(data)
    }

    /// The compiled-in standard catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(standard_data()).expect("built-in catalog must validate")
    }

    /// Resource definitions in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[ResourceDef] {
        &self.resources
    }

    /// Building definitions in declaration order.
    #[must_use]
    pub fn buildings(&self) -> &[BuildingDef] {
        &self.buildings
    }

    /// Upgrade definitions in declaration order.
    #[must_use]
    pub fn upgrades(&self) -> &[UpgradeDef] {
        &self.upgrades
    }

    /// Achievement definitions in declaration order.
    #[must_use]
    pub fn achievements(&self) -> &[AchievementDef] {
        &self.achievements
    }

    /// Look up a resource definition.
    #[must_use]
    pub fn resource(&self, id: &ResourceId) -> Option<&ResourceDef> {
        self.resource_index.get(id).map(|&i| &self.resources[i])
    }

    /// Look up a building definition.
    #[must_use]
    pub fn building(&self, id: &BuildingId) -> Option<&BuildingDef> {
        self.building_index.get(id).map(|&i| &self.buildings[i])
    }

    /// Look up an upgrade definition.
    #[must_use]
    pub fn upgrade(&self, id: &UpgradeId) -> Option<&UpgradeDef> {
        self.upgrade_index.get(id).map(|&i| &self.upgrades[i])
    }

    /// Look up an achievement definition.
    #[must_use]
    pub fn achievement(&self, id: &AchievementId) -> Option<&AchievementDef> {
        self.achievement_index
            .get(id)
            .map(|&i| &self.achievements[i])
    }

    /// The category-multiplier upgrade for a category, if one is defined.
    ///
    /// The first matching declaration wins; catalogs should declare at most
    /// one multiplier upgrade per category.
    #[must_use]
    pub fn upgrade_for_category(&self, category: Category) -> Option<&UpgradeDef> {
        self.upgrades
            .iter()
            .find(|u| u.category == category && u.effect == UpgradeEffect::CategoryMultiplier)
    }

    fn validate(&self) -> Result<()> {
        for def in &self.resources {
            if !def.initial.is_finite() || def.initial < 0.0 {
                return Err(GameError::InvalidDefinition {
                    id: def.id.to_string(),
                    message: format!("initial value {} must be finite and >= 0", def.initial),
                });
            }
            if def.kind == ResourceKind::Percentage && def.initial > 100.0 {
                return Err(GameError::InvalidDefinition {
                    id: def.id.to_string(),
                    message: "percentage resources start within [0, 100]".to_string(),
                });
            }
        }

        for def in &self.buildings {
            self.check_cost_curve(def.id.as_str(), def.base_cost, def.cost_multiplier)?;
            if !def.base_production.is_finite() || def.base_production < 0.0 {
                return Err(GameError::InvalidDefinition {
                    id: def.id.to_string(),
                    message: format!(
                        "base production {} must be finite and >= 0",
                        def.base_production
                    ),
                });
            }
            self.check_resource_ref(def.id.as_str(), &def.output_resource)?;
            self.check_resource_ref(def.id.as_str(), &def.cost_resource)?;
            for threshold in &def.unlock_condition {
                match &threshold.subject {
                    UnlockSubject::Resource(id) => {
                        self.check_resource_ref(def.id.as_str(), id)?;
                    }
                    UnlockSubject::Building(id) => {
                        self.check_building_ref(def.id.as_str(), id)?;
                    }
                }
            }
            if let Some(next) = &def.upgrades_to {
                self.check_building_ref(def.id.as_str(), next)?;
            }
        }
        self.check_upgrade_paths()?;

        for category in Category::ALL {
            let mut found: Option<&UpgradeId> = None;
            for def in &self.upgrades {
                if def.category != category || def.effect != UpgradeEffect::CategoryMultiplier {
                    continue;
                }
                if let Some(first) = found {
                    return Err(GameError::InvalidDefinition {
                        id: def.id.to_string(),
                        message: format!(
                            "second category multiplier for {category:?} (first is `{first}`)"
                        ),
                    });
                }
                found = Some(&def.id);
            }
        }

        for def in &self.upgrades {
            self.check_cost_curve(def.id.as_str(), def.base_cost, def.cost_multiplier)?;
            if def.max_level == 0 {
                return Err(GameError::InvalidDefinition {
                    id: def.id.to_string(),
                    message: "max level must be at least 1".to_string(),
                });
            }
            self.check_resource_ref(def.id.as_str(), &def.cost_resource)?;
            if let UpgradeEffect::FlatRate { resource } = &def.effect {
                self.check_resource_ref(def.id.as_str(), resource)?;
            }
        }

        for def in &self.achievements {
            self.check_condition_refs(def.id.as_str(), &def.condition)?;
            for reward in &def.reward {
                self.check_resource_ref(def.id.as_str(), &reward.resource)?;
            }
        }

        Ok(())
    }

    fn check_cost_curve(&self, id: &str, base_cost: f64, multiplier: f64) -> Result<()> {
        if !multiplier.is_finite() || multiplier <= 1.0 {
            return Err(GameError::InvalidMultiplier {
                id: id.to_string(),
                value: multiplier,
            });
        }
        if !base_cost.is_finite() || base_cost < 1.0 {
            return Err(GameError::InvalidDefinition {
                id: id.to_string(),
                message: format!("base cost {base_cost} must be finite and >= 1"),
            });
        }
        Ok(())
    }

    fn check_resource_ref(&self, owner: &str, id: &ResourceId) -> Result<()> {
        if self.resource_index.contains_key(id) {
            Ok(())
        } else {
            Err(GameError::UnknownReference {
                owner: owner.to_string(),
                kind: "resource",
                id: id.to_string(),
            })
        }
    }

    fn check_building_ref(&self, owner: &str, id: &BuildingId) -> Result<()> {
        if self.building_index.contains_key(id) {
            Ok(())
        } else {
            Err(GameError::UnknownReference {
                owner: owner.to_string(),
                kind: "building",
                id: id.to_string(),
            })
        }
    }

    fn check_upgrade_paths(&self) -> Result<()> {
        for start in &self.buildings {
            let mut visited = HashSet::new();
            visited.insert(&start.id);
            let mut current = start;
            while let Some(next_id) = &current.upgrades_to {
                if !visited.insert(next_id) {
                    return Err(GameError::UpgradePathCycle(start.id.to_string()));
                }
                match self.building(next_id) {
                    Some(next) => current = next,
                    None => break, // dangling refs reported elsewhere
                }
            }
        }
        Ok(())
    }

    fn check_condition_refs(&self, owner: &str, condition: &Condition) -> Result<()> {
        match condition {
            Condition::ResourceAtLeast { resource, .. } => {
                self.check_resource_ref(owner, resource)
            }
            Condition::BuildingCountAtLeast { building, .. } => {
                self.check_building_ref(owner, building)
            }
            Condition::UpgradeLevelAtLeast { upgrade, .. } => {
                if self.upgrade_index.contains_key(upgrade) {
                    Ok(())
                } else {
                    Err(GameError::UnknownReference {
                        owner: owner.to_string(),
                        kind: "upgrade",
                        id: upgrade.to_string(),
                    })
                }
            }
            Condition::StatAtLeast { .. } => Ok(()),
            Condition::All(conditions) => {
                for c in conditions {
                    self.check_condition_refs(owner, c)?;
                }
                Ok(())
            }
        }
    }
}

fn build_index<D, I: std::hash::Hash + Eq + fmt::Display + Clone>(
    defs: &[D],
    kind: &'static str,
    id_of: impl Fn(&D) -> I,
) -> Result<HashMap<I, usize>> {
    let mut index = HashMap::with_capacity(defs.len());
    for (i, def) in defs.iter().enumerate() {
        let id = id_of(def);
        if index.insert(id.clone(), i).is_some() {
            return Err(GameError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

/// The standard city catalog shipped with the engine.
fn standard_data() -> CatalogData {
    use well_known::{COINS, HAPPINESS, POPULATION, RESEARCH};

    CatalogData {
        resources: vec![
            ResourceDef::new(COINS, "Coins").with_initial(50.0),
            ResourceDef::new(POPULATION, "Population"),
            ResourceDef::new(HAPPINESS, "Happiness")
                .percentage()
                .with_initial(100.0),
            ResourceDef::new(RESEARCH, "Research"),
        ],
        buildings: vec![
            BuildingDef::new("cottage", "Cottage", 10.0, 1.15, 0.1, POPULATION, Category::Residential)
                .with_upgrades_to("townhouse"),
            BuildingDef::new("townhouse", "Townhouse", 120.0, 1.15, 0.5, POPULATION, Category::Residential)
                .with_tier(2)
                .with_unlock(vec![Threshold::building("cottage", 5.0)]),
            BuildingDef::new("market", "Market", 25.0, 1.15, 1.0, COINS, Category::Commercial)
                .with_unlock(vec![Threshold::building("cottage", 1.0)]),
            BuildingDef::new("factory", "Factory", 300.0, 1.2, 8.0, COINS, Category::Industrial)
                .with_tier(2)
                .with_unlock(vec![Threshold::resource(POPULATION, 10.0)]),
            BuildingDef::new("laboratory", "Laboratory", 1000.0, 1.25, 0.5, RESEARCH, Category::Research)
                .with_tier(3)
                .with_unlock(vec![Threshold::building("factory", 1.0)]),
            BuildingDef::new("park", "Park", 60.0, 1.15, 0.5, HAPPINESS, Category::Leisure),
        ],
        upgrades: vec![
            UpgradeDef::new("urban_planning", "Urban Planning", 200.0, 1.6, 10, 0.2, Category::Residential),
            UpgradeDef::new("trade_routes", "Trade Routes", 150.0, 1.5, 10, 0.25, Category::Commercial),
            UpgradeDef::new("automation", "Automation", 500.0, 1.5, 10, 0.25, Category::Industrial),
            UpgradeDef::new("curriculum", "Curriculum", 400.0, 2.0, 5, 0.5, Category::Research)
                .with_cost_resource(RESEARCH),
            UpgradeDef::new("festivals", "Festivals", 100.0, 1.5, 10, 0.25, Category::Leisure),
            // Boolean-style upgrade: a single level granting flat happiness regen.
            UpgradeDef::new("city_charter", "City Charter", 5000.0, 2.0, 1, 2.0, Category::Leisure)
                .with_flat_rate(HAPPINESS),
        ],
        achievements: vec![
            AchievementDef::new(
                "first_home",
                "First Home",
                Condition::BuildingCountAtLeast {
                    building: BuildingId::new("cottage"),
                    minimum: 1,
                },
            )
            .with_reward(COINS, 25.0)
            .with_category("progress"),
            AchievementDef::new(
                "industrial_age",
                "Industrial Age",
                Condition::BuildingCountAtLeast {
                    building: BuildingId::new("factory"),
                    minimum: 1,
                },
            )
            .with_reward(COINS, 250.0)
            .with_category("progress"),
            AchievementDef::new(
                "bustling_town",
                "Bustling Town",
                Condition::ResourceAtLeast {
                    resource: ResourceId::new(POPULATION),
                    minimum: 50.0,
                },
            )
            .with_reward(COINS, 500.0)
            .with_category("growth"),
            AchievementDef::new(
                "dedicated_mayor",
                "Dedicated Mayor",
                Condition::StatAtLeast {
                    stat: StatKind::TotalClicks,
                    minimum: 100.0,
                },
            )
            .with_reward(COINS, 100.0)
            .with_category("dedication"),
            AchievementDef::new(
                "magnate",
                "Magnate",
                Condition::StatAtLeast {
                    stat: StatKind::TotalCoinsEarned,
                    minimum: 10_000.0,
                },
            )
            .with_reward(RESEARCH, 10.0)
            .with_category("wealth"),
            AchievementDef::new(
                "well_rounded",
                "Well Rounded",
                Condition::All(vec![
                    Condition::ResourceAtLeast {
                        resource: ResourceId::new(HAPPINESS),
                        minimum: 80.0,
                    },
                    Condition::ResourceAtLeast {
                        resource: ResourceId::new(POPULATION),
                        minimum: 25.0,
                    },
                ]),
            )
            .with_reward(COINS, 1000.0)
            .with_category("harmony"),
        ],
    }
}
