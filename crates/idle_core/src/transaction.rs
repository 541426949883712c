//! Atomic check-then-commit purchase operations.
//!
//! Purchases validate the unlock condition and the price against the current
//! ledger before touching anything; a refused purchase leaves the ledger
//! byte-for-byte identical to before the call. Refusals are ordinary
//! [`PurchaseError`] values, not exceptional errors.
//!
//! Cost curves are strictly increasing: `floor(base * multiplier^owned)`
//! with `multiplier > 1` enforced by catalog validation.

use thiserror::Error;

use crate::catalog::{
    BuildingDef, BuildingId, Catalog, ResourceId, UnlockSubject, UpgradeDef, UpgradeId,
};
use crate::ledger::Ledger;

/// Why a purchase was refused. The ledger is unchanged on every variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PurchaseError {
    /// The building id is not in the catalog.
    #[error("unknown building `{0}`")]
    UnknownBuilding(BuildingId),

    /// The upgrade id is not in the catalog.
    #[error("unknown upgrade `{0}`")]
    UnknownUpgrade(UpgradeId),

    /// An unlock threshold is unmet. Reports the first unmet threshold in
    /// declaration order.
    #[error("locked: requires {subject} >= {required} (have {actual})")]
    Locked {
        /// The threshold subject that failed.
        subject: UnlockSubject,
        /// The minimum required value.
        required: f64,
        /// The current value.
        actual: f64,
    },

    /// The cost exceeds the available balance.
    #[error("cannot afford: need {needed} {resource}, have {available}")]
    Unaffordable {
        /// The resource the price is denominated in.
        resource: ResourceId,
        /// The price.
        needed: f64,
        /// The current balance.
        available: f64,
    },

    /// The upgrade is already at its terminal level.
    #[error("already at max level {level}")]
    MaxLevel {
        /// The terminal level.
        level: u32,
    },
}

/// Successful building purchase details.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingReceipt {
    /// The building purchased.
    pub id: BuildingId,
    /// The price paid.
    pub paid: f64,
    /// The resource the price was paid in.
    pub cost_resource: ResourceId,
    /// Owned count after the purchase.
    pub new_count: u64,
}

/// Successful upgrade purchase details.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeReceipt {
    /// The upgrade purchased.
    pub id: UpgradeId,
    /// The price paid.
    pub paid: f64,
    /// The resource the price was paid in.
    pub cost_resource: ResourceId,
    /// Level after the purchase.
    pub new_level: u32,
}

/// Price of the next instance of a building, given the owned count.
#[must_use]
pub fn building_cost(def: &BuildingDef, owned: u64) -> f64 {
    scaled_cost(def.base_cost, def.cost_multiplier, owned)
}

/// Price of the next level of an upgrade, given the current level.
#[must_use]
pub fn upgrade_cost(def: &UpgradeDef, level: u32) -> f64 {
    scaled_cost(def.base_cost, def.cost_multiplier, u64::from(level))
}

fn scaled_cost(base: f64, multiplier: f64, steps: u64) -> f64 {
    let exponent = steps.min(i32::MAX as u64) as i32;
    (base * multiplier.powi(exponent)).floor()
}

fn check_unlock(def: &BuildingDef, ledger: &Ledger) -> Result<(), PurchaseError> {
    for threshold in &def.unlock_condition {
        let actual = match &threshold.subject {
            UnlockSubject::Resource(id) => ledger.resource(id),
            UnlockSubject::Building(id) => ledger.building_count(id) as f64,
        };
        if actual < threshold.minimum {
            return Err(PurchaseError::Locked {
                subject: threshold.subject.clone(),
                required: threshold.minimum,
                actual,
            });
        }
    }
    Ok(())
}

/// Purchase one instance of a building.
///
/// Checks the unlock condition (first unmet threshold reported), then the
/// price; on success atomically deducts the cost, increments the owned
/// count and the lifetime purchase counter.
///
/// # Errors
///
/// Returns a [`PurchaseError`] describing the refusal; the ledger is not
/// mutated on any error path.
pub fn purchase_building(
    ledger: &mut Ledger,
    catalog: &Catalog,
    id: &BuildingId,
) -> Result<BuildingReceipt, PurchaseError> {
    let def = catalog
        .building(id)
        .ok_or_else(|| PurchaseError::UnknownBuilding(id.clone()))?;

    check_unlock(def, ledger)?;

    let owned = ledger.building_count(id);
    let cost = building_cost(def, owned);
    if !ledger.try_spend(&def.cost_resource, cost) {
        return Err(PurchaseError::Unaffordable {
            resource: def.cost_resource.clone(),
            needed: cost,
            available: ledger.resource(&def.cost_resource),
        });
    }

    let new_count = ledger.add_building(id);
    ledger.statistics_mut().buildings_purchased += 1;

    Ok(BuildingReceipt {
        id: id.clone(),
        paid: cost,
        cost_resource: def.cost_resource.clone(),
        new_count,
    })
}

/// Purchase one level of an upgrade.
///
/// Identical to [`purchase_building`], with an additional terminal-state
/// check: a purchase at `max_level` is refused with
/// [`PurchaseError::MaxLevel`].
///
/// # Errors
///
/// Returns a [`PurchaseError`] describing the refusal; the ledger is not
/// mutated on any error path.
pub fn purchase_upgrade(
    ledger: &mut Ledger,
    catalog: &Catalog,
    id: &UpgradeId,
) -> Result<UpgradeReceipt, PurchaseError> {
    let def = catalog
        .upgrade(id)
        .ok_or_else(|| PurchaseError::UnknownUpgrade(id.clone()))?;

    let level = ledger.upgrade_level(id);
    if level >= def.max_level {
        return Err(PurchaseError::MaxLevel {
            level: def.max_level,
        });
    }

    let cost = upgrade_cost(def, level);
    if !ledger.try_spend(&def.cost_resource, cost) {
        return Err(PurchaseError::Unaffordable {
            resource: def.cost_resource.clone(),
            needed: cost,
            available: ledger.resource(&def.cost_resource),
        });
    }

    let new_level = ledger.raise_upgrade_level(id);

    Ok(UpgradeReceipt {
        id: id.clone(),
        paid: cost,
        cost_resource: def.cost_resource.clone(),
        new_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::well_known;

    fn setup() -> (Catalog, Ledger) {
        let catalog = Catalog::standard();
        let ledger = Ledger::from_catalog(&catalog);
        (catalog, ledger)
    }

    fn coins() -> ResourceId {
        ResourceId::new(well_known::COINS)
    }

    #[test]
    fn test_cost_curve_worked_example() {
        let (catalog, _) = setup();
        let cottage = catalog.building(&"cottage".into()).unwrap();

        // base 10, multiplier 1.15: first is 10, after 5 owned it is
        // floor(10 * 1.15^5) = floor(20.11...) = 20.
        assert_eq!(building_cost(cottage, 0), 10.0);
        assert_eq!(building_cost(cottage, 5), 20.0);
    }

    #[test]
    fn test_cost_strictly_increasing() {
        let (catalog, _) = setup();
        for def in catalog.buildings() {
            for owned in 0..50 {
                assert!(
                    building_cost(def, owned + 1) > building_cost(def, owned),
                    "cost curve for `{}` not increasing at {owned}",
                    def.id
                );
            }
        }
    }

    #[test]
    fn test_purchase_success() {
        let (catalog, mut ledger) = setup();

        let receipt = purchase_building(&mut ledger, &catalog, &"cottage".into()).unwrap();
        assert_eq!(receipt.paid, 10.0);
        assert_eq!(receipt.new_count, 1);
        assert_eq!(ledger.resource(&coins()), 40.0);
        assert_eq!(ledger.statistics().buildings_purchased, 1);
    }

    #[test]
    fn test_unaffordable_leaves_ledger_unchanged() {
        let (catalog, mut ledger) = setup();
        ledger.set_resource(&coins(), 5.0);
        let before = ledger.snapshot();

        let err = purchase_building(&mut ledger, &catalog, &"cottage".into()).unwrap_err();
        assert!(matches!(err, PurchaseError::Unaffordable { needed, .. } if needed == 10.0));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_locked_reports_first_unmet_threshold() {
        let (catalog, mut ledger) = setup();
        ledger.set_resource(&coins(), 10_000.0);

        // Market requires one cottage first.
        let err = purchase_building(&mut ledger, &catalog, &"market".into()).unwrap_err();
        assert!(matches!(
            err,
            PurchaseError::Locked {
                subject: UnlockSubject::Building(ref b),
                required,
                actual,
            } if b.as_str() == "cottage" && required == 1.0 && actual == 0.0
        ));
    }

    #[test]
    fn test_locked_leaves_ledger_unchanged() {
        let (catalog, mut ledger) = setup();
        ledger.set_resource(&coins(), 10_000.0);
        let before = ledger.snapshot();

        purchase_building(&mut ledger, &catalog, &"market".into()).unwrap_err();
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_unlock_opens_after_threshold_met() {
        let (catalog, mut ledger) = setup();
        ledger.set_resource(&coins(), 10_000.0);

        purchase_building(&mut ledger, &catalog, &"cottage".into()).unwrap();
        purchase_building(&mut ledger, &catalog, &"market".into()).unwrap();
        assert_eq!(ledger.building_count(&"market".into()), 1);
    }

    #[test]
    fn test_unknown_building() {
        let (catalog, mut ledger) = setup();
        let err = purchase_building(&mut ledger, &catalog, &"pyramid".into()).unwrap_err();
        assert!(matches!(err, PurchaseError::UnknownBuilding(_)));
    }

    #[test]
    fn test_upgrade_purchase_and_max_level() {
        let (catalog, mut ledger) = setup();
        ledger.set_resource(&coins(), 1_000_000.0);

        // city_charter is the boolean-style upgrade: max level 1.
        let receipt = purchase_upgrade(&mut ledger, &catalog, &"city_charter".into()).unwrap();
        assert_eq!(receipt.new_level, 1);

        let err = purchase_upgrade(&mut ledger, &catalog, &"city_charter".into()).unwrap_err();
        assert!(matches!(err, PurchaseError::MaxLevel { level: 1 }));
    }

    #[test]
    fn test_max_level_checked_before_cost() {
        let (catalog, mut ledger) = setup();
        ledger.set_resource(&coins(), 1_000_000.0);
        purchase_upgrade(&mut ledger, &catalog, &"city_charter".into()).unwrap();
        ledger.set_resource(&coins(), 0.0);
        let before = ledger.snapshot();

        // Terminal state wins over affordability; nothing is mutated.
        let err = purchase_upgrade(&mut ledger, &catalog, &"city_charter".into()).unwrap_err();
        assert!(matches!(err, PurchaseError::MaxLevel { .. }));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_upgrade_cost_rises_per_level() {
        let (catalog, mut ledger) = setup();
        ledger.set_resource(&coins(), 1_000_000.0);

        let first = purchase_upgrade(&mut ledger, &catalog, &"trade_routes".into()).unwrap();
        let second = purchase_upgrade(&mut ledger, &catalog, &"trade_routes".into()).unwrap();
        assert_eq!(first.paid, 150.0);
        assert_eq!(second.paid, 225.0);
    }
}
