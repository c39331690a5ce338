//! Tick orchestration: the economy clock.
//!
//! Each simulated minute runs five stages in a fixed order. The order is
//! the invariant that keeps prices from reading expired modifiers and
//! keeps the one-event-per-location rule intact: expiry always runs before
//! rollout and before recomputation.

use econ_core::{season_at, ItemId, LocationId};
use tracing::trace;

use crate::city::first_match_city_kind;
use crate::market;
use crate::{Economy, EconomyState, LocationEconomy, Notification};

/// (location, item, old price, new price) for one recompute pass.
type PriceChange = (LocationId, ItemId, u32, u32);

impl Economy {
    /// Advance the economy by whole simulated minutes. The host clock
    /// accumulates fractional time; this engine only ever sees integers.
    pub fn tick(&mut self, elapsed_minutes: u64) {
        for _ in 0..elapsed_minutes {
            self.step_minute();
        }
    }

    fn step_minute(&mut self) {
        self.state.clock_minutes += 1;
        let now = self.state.clock_minutes;
        trace!(target: "clock", now, "minute step");

        // 1. Expire due events and fire due scheduled signals.
        self.expire_due_city_events(now);
        self.expire_due_global_events(now);

        // 2. Supply/demand recovery toward baseline.
        self.relax_supply_demand();

        // 3. Saturation, prices, history, alerts.
        let changes = self.recompute_all_prices(now);
        self.check_watches(&changes);

        // 4. Roll replacements only now that expiry and pricing are done.
        self.roll_city_events(now);
        self.roll_global_event();

        // 5. Notifications queued along the way wait for the host to
        //    drain them.
    }

    fn relax_supply_demand(&mut self) {
        let rate = self.config.relaxation_rate;
        let cap = self.config.recovery_cap;
        for locst in self.state.locations.values_mut() {
            for entry in locst.entries.values_mut() {
                entry.relax(rate, cap);
            }
        }
    }

    fn recompute_all_prices(&mut self, now: u64) -> Vec<PriceChange> {
        let mut changes = Vec::new();
        let global_factor = self.state.global.price.factor();
        let EconomyState {
            locations, history, ..
        } = &mut self.state;
        let catalog = &self.catalog;
        let fluctuation = self.config.fluctuation;
        let rng = &mut self.rng;
        for (loc, locst) in locations.iter_mut() {
            let LocationEconomy {
                entries, reputation, ..
            } = locst;
            for (item, entry) in entries.iter_mut() {
                let Some(def) = catalog.get(*item) else {
                    continue;
                };
                entry.recompute_saturation();
                let old = entry.price;
                let new = market::recompute_entry_price(
                    def,
                    entry,
                    reputation,
                    global_factor,
                    now,
                    fluctuation,
                    rng,
                );
                history.record(*loc, *item, new, now);
                changes.push((*loc, *item, old, new));
            }
        }
        changes
    }

    fn check_watches(&mut self, changes: &[PriceChange]) {
        if self.state.watches.is_empty() {
            return;
        }
        for watch in &self.state.watches {
            for &(location, item, old, new) in changes {
                if watch.location == location
                    && watch.item == item
                    && watch.crossed(old, new)
                {
                    self.notifications.push(Notification::PriceAlert {
                        location,
                        item,
                        price: new,
                        threshold: watch.threshold,
                        direction: watch.direction,
                    });
                }
            }
        }
    }

    fn roll_city_events(&mut self, now: u64) {
        let season = season_at(now);
        let idle: Vec<LocationId> = self
            .state
            .locations
            .iter()
            .filter(|(_, l)| l.active_event.is_none())
            .map(|(id, _)| *id)
            .collect();
        for location in idle {
            let kind = first_match_city_kind(&self.city_kinds, season, &mut self.rng).cloned();
            if let Some(kind) = kind {
                self.trigger_city_event(location, &kind);
            }
        }
    }
}
