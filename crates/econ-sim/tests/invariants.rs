//! Cross-component invariants exercised through the public API only.

use econ_core::{EconomyConfig, ItemCatalog, ItemId, LocationId};
use econ_sim::{
    builtin_city_kinds, builtin_global_kinds, CityEventKind, Economy, EffectScope, EventEffect,
    TradeDirection, HISTORY_CAP,
};

const GRAIN: ItemId = ItemId(1);

fn world(config: EconomyConfig) -> (Economy, Vec<LocationId>) {
    let mut eco = Economy::new(ItemCatalog::builtin(), config).unwrap();
    let mut locs = Vec::new();
    for name in ["Saltmarsh", "Highmoor", "Port Respite"] {
        let loc = eco.add_location(name);
        eco.visit_location(loc);
        locs.push(loc);
    }
    (eco, locs)
}

#[test]
fn invariant_at_most_one_city_event_per_location() {
    // Inflated probabilities so events start and end frequently.
    let mut kinds = builtin_city_kinds();
    for kind in &mut kinds {
        kind.chance = 0.2;
        kind.season = None;
        kind.duration_minutes = kind.duration_minutes.min(30);
    }
    let (eco, locs) = world(EconomyConfig::default());
    let mut eco = eco.with_event_tables(kinds, builtin_global_kinds());
    for _ in 0..500 {
        eco.tick(1);
        for &loc in &locs {
            // Option-typed storage makes >1 impossible; the observable
            // invariant is that an active event is never stale.
            if let Some(event) = eco.active_event(loc) {
                assert!(event.remaining(eco.clock_minutes()) > 0);
            }
        }
    }
}

#[test]
fn invariant_event_roundtrip_restores_modifiers() {
    let config = EconomyConfig {
        fluctuation: 0.0,
        global_event_chance: 0.0,
        ..EconomyConfig::default()
    };
    let (eco, locs) = world(config);
    let kind = CityEventKind {
        name: "Bandit Raid".to_string(),
        chance: 1.0,
        season: None,
        duration_minutes: 10,
        effects: vec![EventEffect::Price {
            scope: EffectScope::All,
            value: 0.15,
        }],
    };
    // One kind that can only fire once: after triggering, empty the table.
    let mut eco = eco.with_event_tables(vec![kind], Vec::new());
    let loc = locs[0];

    let before: Vec<Option<f64>> = eco.state().locations[&loc]
        .entries
        .values()
        .map(|e| e.event_modifier)
        .collect();
    assert!(before.iter().all(Option::is_none));

    eco.tick(1);
    assert!(eco.active_event(loc).is_some());
    assert!(eco.state().locations[&loc]
        .entries
        .values()
        .all(|e| e.event_modifier == Some(1.15)));

    let mut eco = Economy::from_state(
        ItemCatalog::builtin(),
        eco.config().clone(),
        eco.export_state(),
    )
    .unwrap()
    .with_event_tables(Vec::new(), Vec::new());
    eco.tick(10);
    assert!(eco.active_event(loc).is_none());
    let after: Vec<Option<f64>> = eco.state().locations[&loc]
        .entries
        .values()
        .map(|e| e.event_modifier)
        .collect();
    assert_eq!(before, after);
}

#[test]
fn invariant_prices_are_positive_integers_everywhere() {
    let (mut eco, locs) = world(EconomyConfig::default());
    for minute in 0..2000u64 {
        if minute % 37 == 0 {
            eco.trade(locs[0], GRAIN, 3, TradeDirection::Buy);
        }
        if minute % 53 == 0 {
            eco.trade(locs[1], GRAIN, 7, TradeDirection::Sell);
        }
        eco.tick(1);
        for &loc in &locs {
            for entry in eco.state().locations[&loc].entries.values() {
                assert!(entry.price >= 1);
                assert!(entry.supply >= 10.0);
                assert!(entry.demand >= 10.0);
            }
            let standing = eco.reputation(loc).unwrap();
            assert!((-100..=100).contains(&standing));
        }
    }
}

#[test]
fn invariant_history_is_bounded() {
    let (mut eco, locs) = world(EconomyConfig::default());
    eco.tick(60);
    for &loc in &locs {
        assert_eq!(eco.state().history.len(loc, GRAIN), HISTORY_CAP);
        // 60 ticks, cap 50: the first 10 snapshots are gone.
        assert_eq!(
            eco.state().history.oldest(loc, GRAIN).unwrap().minute,
            11
        );
    }
}

#[test]
fn invariant_seeded_runs_are_identical() {
    let run = || {
        let (mut eco, locs) = world(EconomyConfig::default());
        eco.trade(locs[0], GRAIN, 5, TradeDirection::Buy);
        eco.tick(300);
        eco.trade(locs[2], GRAIN, 2, TradeDirection::Sell);
        eco.tick(300);
        (
            locs.iter()
                .map(|&l| eco.price_of(l, GRAIN))
                .collect::<Vec<_>>(),
            eco.export_state(),
        )
    };
    let (prices_a, state_a) = run();
    let (prices_b, state_b) = run();
    assert_eq!(prices_a, prices_b);
    assert_eq!(state_a, state_b);
}

#[test]
fn cross_location_comparison_sorts_by_price() {
    let config = EconomyConfig {
        fluctuation: 0.0,
        global_event_chance: 0.0,
        ..EconomyConfig::default()
    };
    let (eco, locs) = world(config);
    let mut eco = eco.with_event_tables(Vec::new(), Vec::new());
    // Drive one location's grain price down with heavy selling.
    for _ in 0..5 {
        eco.trade(locs[1], GRAIN, 20, TradeDirection::Sell);
        eco.tick(1);
    }
    let reports = eco.compare_across_locations(GRAIN);
    assert_eq!(reports.len(), 3);
    assert!(reports.windows(2).all(|w| w[0].price <= w[1].price));
    assert_eq!(reports[0].location, locs[1]);
}
