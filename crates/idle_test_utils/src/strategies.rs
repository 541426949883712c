//! Proptest strategies over host operation scripts.

use proptest::prelude::*;

use idle_core::catalog::Catalog;

use crate::determinism::Op;

/// Strategy producing a single operation valid for the given catalog.
///
/// Purchases may still be refused at runtime (unaffordable, locked); that
/// is intentional - refusal paths are part of what the properties cover.
pub fn op_strategy(catalog: &Catalog) -> impl Strategy<Value = Op> {
    let buildings: Vec<String> = catalog
        .buildings()
        .iter()
        .map(|d| d.id.to_string())
        .collect();
    let upgrades: Vec<String> = catalog
        .upgrades()
        .iter()
        .map(|d| d.id.to_string())
        .collect();
    let resources: Vec<String> = catalog
        .resources()
        .iter()
        .map(|d| d.id.to_string())
        .collect();

    prop_oneof![
        4 => Just(Op::Tick),
        2 => proptest::sample::select(buildings).prop_map(Op::BuyBuilding),
        1 => proptest::sample::select(upgrades).prop_map(Op::BuyUpgrade),
        2 => (proptest::sample::select(resources), 0.0..500.0f64)
            .prop_map(|(resource, amount)| Op::Collect { resource, amount }),
    ]
}

/// Strategy producing an operation script of up to `max_len` steps.
pub fn ops_strategy(catalog: &Catalog, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(op_strategy(catalog), 0..max_len)
}
