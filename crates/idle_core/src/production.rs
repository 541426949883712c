//! Production rate calculation and per-tick resource accrual.
//!
//! All functions here are pure over `(ledger, catalog, params)`; the only
//! mutation entry point is [`apply_tick`], which computes every rate against
//! the pre-tick ledger and then applies them, so within a tick no resource
//! sees another resource's partial update.
//!
//! # Numeric policy
//!
//! Rates are real-valued. Each tick applies `rate * delta_seconds` and then
//! rounds every touched resource once to two decimal places - once per tick,
//! not per building - which bounds floating-point drift over long sessions
//! while keeping the result order-independent.

use crate::catalog::{well_known, Catalog, Category, ResourceId, UpgradeEffect};
use crate::ledger::Ledger;

/// Tunable production constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionParams {
    /// Global output scalar applied to every building.
    pub global_efficiency: f64,
    /// Happiness lost per second per unit of population.
    pub happiness_decay_coefficient: f64,
}

impl Default for ProductionParams {
    fn default() -> Self {
        Self {
            global_efficiency: 1.0,
            happiness_decay_coefficient: 0.1,
        }
    }
}

/// Whether a category's output gate is currently open.
///
/// Gating suppresses output only; owned counts are untouched and resume
/// producing the moment the gate reopens.
#[must_use]
pub fn gate_open(category: Category, ledger: &Ledger) -> bool {
    match category {
        Category::Commercial => ledger.resource_named(well_known::POPULATION) >= 1.0,
        Category::Industrial => ledger.resource_named(well_known::POPULATION) >= 10.0,
        Category::Research => ledger.resource_named(well_known::HAPPINESS) >= 50.0,
        Category::Residential | Category::Leisure => true,
    }
}

/// The production scalar a category's multiplier upgrade contributes.
///
/// `1 + level * per_level_effect`, or exactly 1 when the catalog defines no
/// multiplier upgrade for the category.
#[must_use]
pub fn category_multiplier(category: Category, ledger: &Ledger, catalog: &Catalog) -> f64 {
    match catalog.upgrade_for_category(category) {
        Some(def) => 1.0 + f64::from(ledger.upgrade_level(&def.id)) * def.per_level_effect,
        None => 1.0,
    }
}

/// Net per-second rate for a resource.
///
/// Building output (gated, multiplied), plus flat upgrade bonuses, minus
/// the population-driven happiness decay for the happiness resource. The
/// result may be negative for a decaying resource; resource floors are
/// enforced at application time, not here.
#[must_use]
pub fn rate(resource: &ResourceId, ledger: &Ledger, catalog: &Catalog, params: &ProductionParams) -> f64 {
    let mut rate = 0.0;

    for def in catalog.buildings() {
        if def.output_resource != *resource {
            continue;
        }
        let owned = ledger.building_count(&def.id);
        if owned == 0 || !gate_open(def.category, ledger) {
            continue;
        }
        rate += owned as f64
            * def.base_production
            * params.global_efficiency
            * category_multiplier(def.category, ledger, catalog);
    }

    for def in catalog.upgrades() {
        if let UpgradeEffect::FlatRate { resource: target } = &def.effect {
            if target == resource {
                rate += f64::from(ledger.upgrade_level(&def.id)) * def.per_level_effect;
            }
        }
    }

    if resource.as_str() == well_known::HAPPINESS {
        rate -= ledger.resource_named(well_known::POPULATION) * params.happiness_decay_coefficient;
    }

    rate
}

/// One building's contribution to a resource's rate.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingRate {
    /// The contributing building.
    pub building: crate::catalog::BuildingId,
    /// Owned count.
    pub owned: u64,
    /// Per-second output contributed; zero while gated.
    pub rate: f64,
    /// Whether the category gate is currently suppressing this output.
    pub gated: bool,
}

/// Itemised per-second rate for a resource, for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct RateBreakdown {
    /// The resource described.
    pub resource: ResourceId,
    /// Per-building contributions, in catalog order.
    pub per_building: Vec<BuildingRate>,
    /// Flat per-second bonuses from upgrades.
    pub flat_bonus: f64,
    /// Continuous decay (positive number; subtracted from the net).
    pub decay: f64,
    /// Net per-second rate; equals [`rate`] for the same inputs.
    pub net: f64,
}

/// Itemise a resource's rate by contributor.
#[must_use]
pub fn breakdown(
    resource: &ResourceId,
    ledger: &Ledger,
    catalog: &Catalog,
    params: &ProductionParams,
) -> RateBreakdown {
    let mut per_building = Vec::new();
    let mut net = 0.0;

    for def in catalog.buildings() {
        if def.output_resource != *resource {
            continue;
        }
        let owned = ledger.building_count(&def.id);
        if owned == 0 {
            continue;
        }
        let open = gate_open(def.category, ledger);
        let building_rate = if open {
            owned as f64
                * def.base_production
                * params.global_efficiency
                * category_multiplier(def.category, ledger, catalog)
        } else {
            0.0
        };
        net += building_rate;
        per_building.push(BuildingRate {
            building: def.id.clone(),
            owned,
            rate: building_rate,
            gated: !open,
        });
    }

    let mut flat_bonus = 0.0;
    for def in catalog.upgrades() {
        if let UpgradeEffect::FlatRate { resource: target } = &def.effect {
            if target == resource {
                flat_bonus += f64::from(ledger.upgrade_level(&def.id)) * def.per_level_effect;
            }
        }
    }
    net += flat_bonus;

    let mut decay = 0.0;
    if resource.as_str() == well_known::HAPPINESS {
        decay = ledger.resource_named(well_known::POPULATION) * params.happiness_decay_coefficient;
        net -= decay;
    }

    RateBreakdown {
        resource: resource.clone(),
        per_building,
        flat_bonus,
        decay,
        net,
    }
}

/// Advance every resource by one tick of production.
///
/// Rates are computed for all resources against the pre-tick ledger, then
/// applied and rounded (once per resource). Positive coin deltas count
/// toward lifetime earnings.
pub fn apply_tick(ledger: &mut Ledger, catalog: &Catalog, params: &ProductionParams, delta_seconds: f64) {
    let deltas: Vec<(ResourceId, f64)> = catalog
        .resources()
        .iter()
        .map(|def| {
            (
                def.id.clone(),
                rate(&def.id, ledger, catalog, params) * delta_seconds,
            )
        })
        .collect();

    for (id, delta) in deltas {
        if delta == 0.0 {
            continue;
        }
        ledger.earn(&id, delta);
        ledger.round_resource(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuildingId;
    use crate::ledger::Ledger;

    fn setup() -> (Catalog, Ledger) {
        let catalog = Catalog::standard();
        let ledger = Ledger::from_catalog(&catalog);
        (catalog, ledger)
    }

    fn coins() -> ResourceId {
        ResourceId::new(well_known::COINS)
    }

    fn population() -> ResourceId {
        ResourceId::new(well_known::POPULATION)
    }

    fn happiness() -> ResourceId {
        ResourceId::new(well_known::HAPPINESS)
    }

    #[test]
    fn test_base_building_rate() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        // Ten markets at 1.0 coins/s each, population gate open.
        ledger.set_resource(&population(), 5.0);
        for _ in 0..10 {
            ledger.add_building(&BuildingId::new("market"));
        }
        assert_eq!(rate(&coins(), &ledger, &catalog, &params), 10.0);
    }

    #[test]
    fn test_commercial_gate_suppresses_output() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.add_building(&BuildingId::new("market"));
        assert_eq!(ledger.resource(&population()), 0.0);
        assert_eq!(rate(&coins(), &ledger, &catalog, &params), 0.0);

        // Count is preserved; output resumes when the gate opens.
        ledger.set_resource(&population(), 1.0);
        assert_eq!(rate(&coins(), &ledger, &catalog, &params), 1.0);
        assert_eq!(ledger.building_count(&BuildingId::new("market")), 1);
    }

    #[test]
    fn test_industrial_gate_needs_ten_population() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.add_building(&BuildingId::new("factory"));
        ledger.set_resource(&population(), 9.0);
        assert_eq!(rate(&coins(), &ledger, &catalog, &params), 0.0);

        ledger.set_resource(&population(), 10.0);
        assert_eq!(rate(&coins(), &ledger, &catalog, &params), 8.0);
    }

    #[test]
    fn test_research_gate_needs_happiness() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();
        let research = ResourceId::new(well_known::RESEARCH);

        ledger.add_building(&BuildingId::new("laboratory"));
        ledger.set_resource(&happiness(), 49.0);
        assert_eq!(rate(&research, &ledger, &catalog, &params), 0.0);

        ledger.set_resource(&happiness(), 50.0);
        assert_eq!(rate(&research, &ledger, &catalog, &params), 0.5);
    }

    #[test]
    fn test_category_multiplier_scales_output() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.set_resource(&population(), 5.0);
        ledger.add_building(&BuildingId::new("market"));
        ledger.set_upgrade_level(&"trade_routes".into(), 4);

        // 1 market * 1.0/s * (1 + 4 * 0.25) = 2.0/s
        assert_eq!(rate(&coins(), &ledger, &catalog, &params), 2.0);
    }

    #[test]
    fn test_happiness_decay_formula() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        // Population 100, coefficient 0.1/s, one 0.1 s tick => -1.0 happiness.
        ledger.set_resource(&population(), 100.0);
        apply_tick(&mut ledger, &catalog, &params, 0.1);
        assert_eq!(ledger.resource(&happiness()), 99.0);
    }

    #[test]
    fn test_happiness_floor_zero() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.set_resource(&population(), 100.0);
        ledger.set_resource(&happiness(), 0.5);
        apply_tick(&mut ledger, &catalog, &params, 0.1);
        assert_eq!(ledger.resource(&happiness()), 0.0);
    }

    #[test]
    fn test_happiness_cap_hundred() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        for _ in 0..100 {
            ledger.add_building(&BuildingId::new("park"));
        }
        apply_tick(&mut ledger, &catalog, &params, 0.1);
        assert_eq!(ledger.resource(&happiness()), 100.0);
    }

    #[test]
    fn test_flat_rate_upgrade() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.set_resource(&happiness(), 50.0);
        ledger.set_upgrade_level(&"city_charter".into(), 1);
        assert_eq!(rate(&happiness(), &ledger, &catalog, &params), 2.0);
    }

    #[test]
    fn test_rounding_once_per_tick() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        // 3 cottages at 0.1 pop/s for 0.1 s = 0.03 population, representable
        // only after the per-tick rounding.
        for _ in 0..3 {
            ledger.add_building(&BuildingId::new("cottage"));
        }
        apply_tick(&mut ledger, &catalog, &params, 0.1);
        assert_eq!(ledger.resource(&population()), 0.03);
    }

    #[test]
    fn test_production_counts_toward_earnings() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.set_resource(&population(), 5.0);
        ledger.add_building(&BuildingId::new("market"));
        apply_tick(&mut ledger, &catalog, &params, 1.0);
        assert_eq!(ledger.statistics().total_coins_earned, 1.0);
    }

    #[test]
    fn test_breakdown_matches_rate() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.set_resource(&population(), 20.0);
        for _ in 0..3 {
            ledger.add_building(&BuildingId::new("market"));
        }
        ledger.add_building(&BuildingId::new("factory"));
        ledger.set_upgrade_level(&"trade_routes".into(), 2);

        let itemised = breakdown(&coins(), &ledger, &catalog, &params);
        assert_eq!(itemised.net, rate(&coins(), &ledger, &catalog, &params));
        assert_eq!(itemised.per_building.len(), 2);
    }

    #[test]
    fn test_breakdown_marks_gated_buildings() {
        let (catalog, mut ledger) = setup();
        let params = ProductionParams::default();

        ledger.add_building(&BuildingId::new("market"));
        let itemised = breakdown(&coins(), &ledger, &catalog, &params);
        assert_eq!(itemised.per_building.len(), 1);
        assert!(itemised.per_building[0].gated);
        assert_eq!(itemised.per_building[0].rate, 0.0);
        assert_eq!(itemised.net, 0.0);
    }
}
