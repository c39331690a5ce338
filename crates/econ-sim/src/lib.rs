#![deny(warnings)]

//! Economic simulation engine for Tradewinds.
//!
//! One [`Economy`] value owns every piece of mutable simulation state: the
//! per-settlement market ledgers, reputation records, active events, the
//! world-scoped modifier ledgers, and the bounded price history. The host
//! game mutates it through trade calls and [`Economy::tick`], and reads it
//! through owned snapshots; there are no ambient globals and no I/O.

pub mod city;
pub mod events;
pub mod global;
pub mod history;
pub mod market;
mod news;
pub mod notify;
pub mod reputation;

mod clock;

pub use city::{builtin_city_kinds, ActiveCityEvent, CityEventKind};
pub use events::{EffectFootprint, EffectScope, EventEffect, EventId, ModifierLedger};
pub use global::{
    builtin_global_kinds, ActiveGlobalEvent, GlobalEventKind, GlobalState, ScheduledSignal,
};
pub use history::{PriceHistory, PriceSnapshot, Trend, HISTORY_CAP, TREND_WINDOW};
pub use market::{
    MarketEntry, PriceInputs, PriceStage, TradeDirection, TradeOutcome, TradeRejection,
};
pub use notify::{Notification, PriceWatch, WatchDirection};
pub use reputation::{ReputationRecord, MAX_STANDING, MIN_STANDING};

use econ_core::{
    validate_config, ConfigError, EconomyConfig, ItemCatalog, ItemCategory, ItemId, LocationId,
    Rarity,
};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Trailing-average window used when comparing an item across locations.
pub const COMPARE_WINDOW_MINUTES: u64 = 720;

/// One settlement's economy: its market entries, the player's standing
/// there, and at most one active city event (structurally enforced).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationEconomy {
    pub name: String,
    pub entries: BTreeMap<ItemId, MarketEntry>,
    pub reputation: ReputationRecord,
    pub active_event: Option<ActiveCityEvent>,
    /// Whether the default stock list has been seeded here.
    pub seeded: bool,
}

/// All mutable simulation state, in one serializable root. Restoring a
/// saved state recomputes nothing; stored values are authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyState {
    /// Absolute simulated minute.
    pub clock_minutes: u64,
    /// Seed the engine RNG was created from.
    pub rng_seed: u64,
    pub next_event_id: u64,
    pub locations: BTreeMap<LocationId, LocationEconomy>,
    pub global: GlobalState,
    pub history: PriceHistory,
    pub watches: Vec<PriceWatch>,
}

impl EconomyState {
    fn empty(rng_seed: u64) -> Self {
        Self {
            clock_minutes: 0,
            rng_seed,
            next_event_id: 1,
            locations: BTreeMap::new(),
            global: GlobalState::default(),
            history: PriceHistory::default(),
            watches: Vec::new(),
        }
    }
}

/// Read-only view of one market row, for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub item: ItemId,
    pub name: String,
    pub category: ItemCategory,
    pub price: u32,
    pub stock: u32,
    pub trend: Trend,
}

/// Read-only view of one settlement's market.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub location: LocationId,
    pub name: String,
    pub standing: i32,
    pub access_level: i8,
    pub entries: Vec<EntrySnapshot>,
}

/// One row of a cross-location price comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationPriceReport {
    pub location: LocationId,
    pub name: String,
    pub price: u32,
    pub trend: Trend,
    pub average: f64,
}

/// The engine root. See the crate docs for the ownership story.
#[derive(Debug)]
pub struct Economy {
    pub(crate) catalog: ItemCatalog,
    pub(crate) config: EconomyConfig,
    pub(crate) city_kinds: Vec<CityEventKind>,
    pub(crate) global_kinds: Vec<GlobalEventKind>,
    pub(crate) state: EconomyState,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) notifications: Vec<Notification>,
}

impl Economy {
    /// Build a fresh economy with the builtin event tables.
    pub fn new(catalog: ItemCatalog, config: EconomyConfig) -> Result<Self, ConfigError> {
        use rand::SeedableRng;
        validate_config(&config)?;
        let seed = config.rng_seed;
        Ok(Self {
            catalog,
            config,
            city_kinds: builtin_city_kinds(),
            global_kinds: builtin_global_kinds(),
            state: EconomyState::empty(seed),
            rng: ChaCha8Rng::seed_from_u64(seed),
            notifications: Vec::new(),
        })
    }

    /// Restore an economy from saved state. The RNG is re-seeded from the
    /// stored seed; stored prices and modifiers are taken as-is.
    pub fn from_state(
        catalog: ItemCatalog,
        config: EconomyConfig,
        state: EconomyState,
    ) -> Result<Self, ConfigError> {
        use rand::SeedableRng;
        validate_config(&config)?;
        let rng = ChaCha8Rng::seed_from_u64(state.rng_seed);
        Ok(Self {
            catalog,
            config,
            city_kinds: builtin_city_kinds(),
            global_kinds: builtin_global_kinds(),
            state,
            rng,
            notifications: Vec::new(),
        })
    }

    /// Replace the event tables. Mostly useful for tests and scenario
    /// tuning.
    pub fn with_event_tables(
        mut self,
        city: Vec<CityEventKind>,
        global: Vec<GlobalEventKind>,
    ) -> Self {
        self.city_kinds = city;
        self.global_kinds = global;
        self
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn state(&self) -> &EconomyState {
        &self.state
    }

    /// Owned copy of the full state, e.g. for saving.
    pub fn export_state(&self) -> EconomyState {
        self.state.clone()
    }

    pub fn clock_minutes(&self) -> u64 {
        self.state.clock_minutes
    }

    pub(crate) fn next_event_id(&mut self) -> EventId {
        let id = EventId(self.state.next_event_id);
        self.state.next_event_id += 1;
        id
    }

    // -----------------------------------------------------------------
    // World building
    // -----------------------------------------------------------------

    /// Register a settlement. Its reputation record exists from this point;
    /// its market is seeded on first visit or explicitly.
    pub fn add_location(&mut self, name: impl Into<String>) -> LocationId {
        let id = LocationId(
            self.state
                .locations
                .keys()
                .next_back()
                .map_or(1, |l| l.0 + 1),
        );
        self.state.locations.insert(
            id,
            LocationEconomy {
                name: name.into(),
                ..LocationEconomy::default()
            },
        );
        id
    }

    /// Explicitly seed a location with items and stock levels. Unknown
    /// item ids are skipped.
    pub fn seed_location(&mut self, location: LocationId, items: &[(ItemId, u32)]) {
        if !self.state.locations.contains_key(&location) {
            return;
        }
        for &(item, stock) in items {
            self.ensure_entry(location, item, stock);
        }
        if let Some(locst) = self.state.locations.get_mut(&location) {
            locst.seeded = true;
        }
    }

    /// Lazy-seeding hook: on first visit, stock every common and uncommon
    /// catalog item at the default level.
    pub fn visit_location(&mut self, location: LocationId) {
        let needs_seed = self
            .state
            .locations
            .get(&location)
            .is_some_and(|l| !l.seeded);
        if !needs_seed {
            return;
        }
        let defaults: Vec<(ItemId, u32)> = self
            .catalog
            .iter()
            .filter(|d| d.rarity <= Rarity::Uncommon)
            .map(|d| (d.id, self.config.default_stock))
            .collect();
        self.seed_location(location, &defaults);
    }

    /// Create a market entry if absent, pricing it immediately. Returns
    /// true if an entry was created.
    pub(crate) fn ensure_entry(&mut self, location: LocationId, item: ItemId, stock: u32) -> bool {
        let now = self.state.clock_minutes;
        let global_factor = self.state.global.price.factor();
        let Some(def) = self.catalog.get(item) else {
            return false;
        };
        let Some(locst) = self.state.locations.get_mut(&location) else {
            return false;
        };
        if locst.entries.contains_key(&item) {
            return false;
        }
        let mut entry = MarketEntry::seeded(stock, self.config.base_supply, self.config.base_demand);
        entry.recompute_saturation();
        market::recompute_entry_price(
            def,
            &mut entry,
            &locst.reputation,
            global_factor,
            now,
            self.config.fluctuation,
            &mut self.rng,
        );
        locst.entries.insert(item, entry);
        true
    }

    // -----------------------------------------------------------------
    // Trades and gifts
    // -----------------------------------------------------------------

    /// Execute a player trade at the currently displayed price. Rejections
    /// are soft and leave every ledger untouched.
    pub fn trade(
        &mut self,
        location: LocationId,
        item: ItemId,
        quantity: u32,
        direction: TradeDirection,
    ) -> TradeOutcome {
        if quantity == 0 {
            return TradeOutcome::Rejected(TradeRejection::InvalidQuantity);
        }
        if !self.catalog.contains(item) {
            return TradeOutcome::Rejected(TradeRejection::UnknownItem);
        }
        if !self.state.locations.contains_key(&location) {
            return TradeOutcome::Rejected(TradeRejection::UnknownLocation);
        }

        let unit_price = match direction {
            TradeDirection::Buy => {
                let Some(entry) = self
                    .state
                    .locations
                    .get_mut(&location)
                    .and_then(|l| l.entries.get_mut(&item))
                else {
                    return TradeOutcome::Rejected(TradeRejection::InsufficientStock {
                        available: 0,
                    });
                };
                if entry.stock < quantity {
                    return TradeOutcome::Rejected(TradeRejection::InsufficientStock {
                        available: entry.stock,
                    });
                }
                let price = entry.price;
                entry.record_trade(i64::from(quantity));
                price
            }
            TradeDirection::Sell => {
                // A sale may introduce an item the settlement never stocked.
                self.ensure_entry(location, item, 0);
                let Some(entry) = self
                    .state
                    .locations
                    .get_mut(&location)
                    .and_then(|l| l.entries.get_mut(&item))
                else {
                    return TradeOutcome::Rejected(TradeRejection::UnknownItem);
                };
                let price = entry.price;
                entry.record_trade(-i64::from(quantity));
                price
            }
        };

        self.change_reputation(location, self.config.trade_reputation_gain);
        debug!(
            target: "trade",
            %location,
            %item,
            quantity,
            ?direction,
            unit_price,
            "trade filled"
        );
        TradeOutcome::filled(unit_price, quantity)
    }

    /// Donate one unit of an item: reputation rises with the item's value.
    /// Returns the new standing, or None for unknown ids.
    pub fn gift(&mut self, location: LocationId, item: ItemId) -> Option<i32> {
        let def = self.catalog.get(item)?;
        if !self.state.locations.contains_key(&location) {
            return None;
        }
        let raw = (def.base_price / self.config.gift_value_divisor.max(1)) as i32;
        let gain = raw.clamp(1, self.config.gift_reputation_cap.max(1));
        self.change_reputation(location, gain)
    }

    /// Shift standing at a location, clamping into [-100, 100] and queueing
    /// a notification for any nonzero applied change. Returns the new
    /// standing.
    pub fn change_reputation(&mut self, location: LocationId, delta: i32) -> Option<i32> {
        let locst = self.state.locations.get_mut(&location)?;
        let applied = locst.reputation.shift(delta);
        let standing = locst.reputation.standing;
        if applied != 0 {
            debug!(target: "reputation", %location, applied, standing, "reputation changed");
            self.notifications.push(Notification::ReputationChanged {
                location,
                delta: applied,
                standing,
            });
        }
        Some(standing)
    }

    // -----------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------

    /// Displayed price, as last computed. None for unknown ids.
    pub fn price_of(&self, location: LocationId, item: ItemId) -> Option<u32> {
        Some(
            self.state
                .locations
                .get(&location)?
                .entries
                .get(&item)?
                .price,
        )
    }

    pub fn reputation(&self, location: LocationId) -> Option<i32> {
        Some(self.state.locations.get(&location)?.reputation.standing)
    }

    pub fn access_level(&self, location: LocationId) -> Option<i8> {
        Some(
            self.state
                .locations
                .get(&location)?
                .reputation
                .access_level(),
        )
    }

    /// Owned snapshot of one settlement's market for display.
    pub fn market_snapshot(&self, location: LocationId) -> Option<MarketSnapshot> {
        let locst = self.state.locations.get(&location)?;
        let entries = locst
            .entries
            .iter()
            .filter_map(|(id, entry)| {
                let def = self.catalog.get(*id)?;
                Some(EntrySnapshot {
                    item: *id,
                    name: def.name.clone(),
                    category: def.category,
                    price: entry.price,
                    stock: entry.stock,
                    trend: self.state.history.trend(location, *id),
                })
            })
            .collect();
        Some(MarketSnapshot {
            location,
            name: locst.name.clone(),
            standing: locst.reputation.standing,
            access_level: locst.reputation.access_level(),
            entries,
        })
    }

    pub fn price_trend(&self, location: LocationId, item: ItemId) -> Trend {
        self.state.history.trend(location, item)
    }

    /// Trailing mean over `window_minutes`; 0 if no snapshots fall inside.
    pub fn price_average(&self, location: LocationId, item: ItemId, window_minutes: u64) -> f64 {
        self.state
            .history
            .average(location, item, self.state.clock_minutes, window_minutes)
    }

    /// Locations currently stocking `item`, cheapest first, annotated with
    /// trend and trailing average.
    pub fn compare_across_locations(&self, item: ItemId) -> Vec<LocationPriceReport> {
        let now = self.state.clock_minutes;
        let mut reports: Vec<LocationPriceReport> = self
            .state
            .locations
            .iter()
            .filter_map(|(loc, locst)| {
                let entry = locst.entries.get(&item)?;
                if entry.stock == 0 {
                    return None;
                }
                Some(LocationPriceReport {
                    location: *loc,
                    name: locst.name.clone(),
                    price: entry.price,
                    trend: self.state.history.trend(*loc, item),
                    average: self
                        .state
                        .history
                        .average(*loc, item, now, COMPARE_WINDOW_MINUTES),
                })
            })
            .collect();
        reports.sort_by_key(|r| r.price);
        reports
    }

    /// Register a price alert; it persists and fires on every crossing.
    pub fn watch_price(&mut self, watch: PriceWatch) {
        self.state.watches.push(watch);
    }

    /// Hand queued notifications to the host, emptying the queue.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // -----------------------------------------------------------------
    // Effect application and reversal
    // -----------------------------------------------------------------

    /// The single generic effect application routine. Every effect in the
    /// set applies (all-apply; kind *selection* is what uses first-match).
    /// Returns the footprint to reverse at expiry.
    pub(crate) fn apply_effects(
        &mut self,
        source: EventId,
        location: Option<LocationId>,
        effects: &[EventEffect],
    ) -> EffectFootprint {
        let mut footprint = EffectFootprint::default();
        for effect in effects {
            match effect {
                EventEffect::Price { scope, value } => {
                    let Some(loc) = location else {
                        debug_assert!(false, "location-scoped price effect on a global event");
                        continue;
                    };
                    let Some(locst) = self.state.locations.get_mut(&loc) else {
                        continue;
                    };
                    for (item, entry) in locst.entries.iter_mut() {
                        let Some(def) = self.catalog.get(*item) else {
                            continue;
                        };
                        if scope.matches(*item, def.category) {
                            entry.event_modifier =
                                Some(entry.event_modifier.unwrap_or(1.0) * (1.0 + value));
                            if !footprint.items.contains(item) {
                                footprint.items.push(*item);
                            }
                        }
                    }
                }
                EventEffect::Reputation { delta } => {
                    let Some(loc) = location else {
                        debug_assert!(false, "reputation effect on a global event");
                        continue;
                    };
                    self.change_reputation(loc, *delta);
                }
                EventEffect::UnlockSpecialGoods => {
                    let Some(loc) = location else {
                        debug_assert!(false, "special goods effect on a global event");
                        continue;
                    };
                    self.unlock_special_goods(loc);
                }
                EventEffect::GlobalPrice { value } => {
                    self.state.global.price.contribute(source, *value);
                    footprint.price_ledger = true;
                }
                EventEffect::TravelSpeed { value } => {
                    self.state.global.travel.contribute(source, *value);
                    footprint.travel_ledger = true;
                }
            }
        }
        footprint
    }

    /// Reverse exactly what `apply_effects` recorded. Reversing something
    /// that was never set indicates a sequencing bug upstream.
    pub(crate) fn retract_effects(
        &mut self,
        source: EventId,
        location: Option<LocationId>,
        footprint: &EffectFootprint,
    ) {
        if let Some(loc) = location {
            if let Some(locst) = self.state.locations.get_mut(&loc) {
                for item in &footprint.items {
                    if let Some(entry) = locst.entries.get_mut(item) {
                        debug_assert!(
                            entry.event_modifier.is_some(),
                            "reversing a modifier never set: {item}"
                        );
                        entry.event_modifier = None;
                    }
                }
            }
        }
        if footprint.price_ledger {
            let removed = self.state.global.price.retract(source);
            debug_assert!(removed, "reversing a price contribution never made: {source}");
        }
        if footprint.travel_ledger {
            let removed = self.state.global.travel.retract(source);
            debug_assert!(
                removed,
                "reversing a travel contribution never made: {source}"
            );
        }
    }

    /// Lazily stock special goods: rare-and-above catalog items the
    /// settlement does not carry yet, one plus the (non-negative) access
    /// tier of them. The entries outlive the triggering event.
    fn unlock_special_goods(&mut self, location: LocationId) {
        let Some(locst) = self.state.locations.get(&location) else {
            return;
        };
        let count = 1 + locst.reputation.access_level().max(0) as usize;
        let candidates: Vec<ItemId> = self
            .catalog
            .iter()
            .filter(|d| d.rarity >= Rarity::Rare && !locst.entries.contains_key(&d.id))
            .map(|d| d.id)
            .take(count)
            .collect();
        let stock = self.config.default_stock;
        for item in candidates {
            self.ensure_entry(location, item, stock);
        }
    }
}
