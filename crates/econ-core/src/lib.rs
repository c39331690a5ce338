#![deny(warnings)]

//! Core domain models and invariants for the Tradewinds economy engine.
//!
//! This crate defines the immutable item catalog, the simulated calendar,
//! and the engine configuration shared by the simulation crates, with
//! validation helpers to guarantee basic invariants.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Unique identifier for a tradeable item.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ItemId(pub u16);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Unique identifier for a settlement.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct LocationId(pub u16);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loc#{}", self.0)
    }
}

/// Broad categories used for category-scoped price effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Staple foodstuffs.
    Food,
    /// Ale, wine and the like.
    Drink,
    /// Raw and processed materials.
    Material,
    /// Tools and hardware.
    Tool,
    /// High-margin luxury goods.
    Luxury,
    /// Oddities and collector pieces.
    Curiosity,
}

impl ItemCategory {
    /// Consumables are subject to the morning demand bump in the pricing
    /// pipeline.
    pub fn is_consumable(self) -> bool {
        matches!(self, ItemCategory::Food | ItemCategory::Drink)
    }
}

/// Rarity tier with its associated price multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Exotic,
}

impl Rarity {
    /// Multiplier applied to an item's base price before all other stages.
    pub fn price_multiplier(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 1.5,
            Rarity::Rare => 2.5,
            Rarity::Exotic => 4.0,
        }
    }
}

/// A tradeable item definition. Created once at catalog load; never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    pub category: ItemCategory,
    pub rarity: Rarity,
    /// Base price in coins (> 0).
    pub base_price: u32,
    /// Unit weight in kilograms.
    pub weight_kg: f32,
    /// Maximum units per inventory stack.
    pub stack_size: u16,
}

/// Validation errors for the item catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Two definitions share an id.
    #[error("duplicate item id: {0}")]
    DuplicateItem(ItemId),
    /// Base price must be strictly positive.
    #[error("base price must be > 0 for {0}")]
    ZeroBasePrice(ItemId),
    /// Display name must be non-empty.
    #[error("empty name for {0}")]
    EmptyName(ItemId),
    /// Weight must be finite and non-negative.
    #[error("invalid weight for {0}")]
    InvalidWeight(ItemId),
    /// Stack size must be strictly positive.
    #[error("zero stack size for {0}")]
    ZeroStackSize(ItemId),
}

/// Static, immutable registry of item definitions. Loaded once; referenced
/// by id everywhere else.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, ItemDefinition>,
}

impl ItemCatalog {
    /// Build a catalog from definitions, validating every entry.
    pub fn from_items(defs: Vec<ItemDefinition>) -> Result<Self, CatalogError> {
        let mut items = BTreeMap::new();
        for def in defs {
            validate_item(&def)?;
            if items.insert(def.id, def.clone()).is_some() {
                return Err(CatalogError::DuplicateItem(def.id));
            }
        }
        Ok(Self { items })
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The default catalog shipped with the game.
    pub fn builtin() -> Self {
        let mk = |id, name: &str, category, rarity, base_price, weight_kg, stack_size| {
            ItemDefinition {
                id: ItemId(id),
                name: name.to_string(),
                category,
                rarity,
                base_price,
                weight_kg,
                stack_size,
            }
        };
        use ItemCategory::*;
        use Rarity::*;
        let defs = vec![
            mk(1, "Grain", Food, Common, 8, 1.0, 50),
            mk(2, "Salted Fish", Food, Common, 12, 0.8, 40),
            mk(3, "Ale", Drink, Common, 10, 1.2, 30),
            mk(4, "Wine", Drink, Uncommon, 24, 1.1, 20),
            mk(5, "Wool", Material, Common, 15, 0.5, 40),
            mk(6, "Timber", Material, Common, 18, 4.0, 20),
            mk(7, "Iron Ingot", Material, Uncommon, 35, 2.5, 25),
            mk(8, "Rope", Tool, Common, 14, 1.5, 30),
            mk(9, "Compass", Tool, Rare, 60, 0.3, 5),
            mk(10, "Spices", Luxury, Rare, 45, 0.2, 25),
            mk(11, "Silk", Luxury, Rare, 55, 0.3, 20),
            mk(12, "Amber Pendant", Luxury, Exotic, 80, 0.1, 10),
            mk(13, "Star Chart", Curiosity, Exotic, 95, 0.2, 5),
        ];
        Self::from_items(defs).expect("builtin catalog is valid")
    }
}

fn validate_item(def: &ItemDefinition) -> Result<(), CatalogError> {
    if def.name.trim().is_empty() {
        return Err(CatalogError::EmptyName(def.id));
    }
    if def.base_price == 0 {
        return Err(CatalogError::ZeroBasePrice(def.id));
    }
    if !def.weight_kg.is_finite() || def.weight_kg < 0.0 {
        return Err(CatalogError::InvalidWeight(def.id));
    }
    if def.stack_size == 0 {
        return Err(CatalogError::ZeroStackSize(def.id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Simulated minutes per day.
pub const MINUTES_PER_DAY: u64 = 24 * 60;

/// Days per season.
pub const DAYS_PER_SEASON: u64 = 90;

/// The four seasons, cycling every `4 * DAYS_PER_SEASON` days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// Season for an absolute simulated minute.
pub fn season_at(minute: u64) -> Season {
    let day = minute / MINUTES_PER_DAY;
    match (day / DAYS_PER_SEASON) % 4 {
        0 => Season::Spring,
        1 => Season::Summer,
        2 => Season::Autumn,
        _ => Season::Winter,
    }
}

/// Minute within the current day, in `0..MINUTES_PER_DAY`.
pub fn minute_of_day(minute: u64) -> u64 {
    minute % MINUTES_PER_DAY
}

/// Morning runs from 06:00 to 12:00.
pub fn is_morning(minute: u64) -> bool {
    (360..720).contains(&minute_of_day(minute))
}

/// Render an absolute minute as "day N, HH:MM" for digests and logs.
pub fn format_timestamp(minute: u64) -> String {
    let day = minute / MINUTES_PER_DAY + 1;
    let of_day = minute_of_day(minute);
    let time = NaiveTime::from_hms_opt(of_day as u32 / 60, of_day as u32 % 60, 0)
        .unwrap_or(NaiveTime::MIN);
    format!("day {day}, {}", time.format("%H:%M"))
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Engine configuration. Defaults match the shipped game balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Seed for the deterministic RNG.
    pub rng_seed: u64,
    /// Supply assigned to entries seeded without an explicit value.
    pub base_supply: f64,
    /// Demand assigned to entries seeded without an explicit value.
    pub base_demand: f64,
    /// Stock assigned to entries seeded without an explicit value.
    pub default_stock: u32,
    /// Fraction of the remaining distance to base that supply/demand
    /// recover per tick.
    pub relaxation_rate: f64,
    /// Supply/demand never recover beyond this multiple of their base.
    pub recovery_cap: f64,
    /// Half-width of the uniform per-tick price fluctuation.
    pub fluctuation: f64,
    /// Probability of the single global event roll succeeding per tick.
    pub global_event_chance: f64,
    /// Reputation gained per completed trade.
    pub trade_reputation_gain: i32,
    /// A gift grants `base_price / gift_value_divisor` reputation.
    pub gift_value_divisor: u32,
    /// Upper bound on reputation gained from one gift.
    pub gift_reputation_cap: i32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            base_supply: 100.0,
            base_demand: 100.0,
            default_stock: 20,
            relaxation_rate: 0.02,
            recovery_cap: 1.5,
            fluctuation: 0.05,
            global_event_chance: 0.0005,
            trade_reputation_gain: 1,
            gift_value_divisor: 25,
            gift_reputation_cap: 10,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("relaxation rate must be within [0, 1]")]
    InvalidRelaxationRate,
    #[error("recovery cap must be >= 1")]
    InvalidRecoveryCap,
    #[error("fluctuation must be within [0, 1)")]
    InvalidFluctuation,
    #[error("global event chance must be within [0, 1]")]
    InvalidEventChance,
    #[error("non-finite numeric value encountered")]
    NonFinite,
}

/// Validate a configuration before handing it to the engine.
pub fn validate_config(cfg: &EconomyConfig) -> Result<(), ConfigError> {
    if !(cfg.base_supply.is_finite() && cfg.base_demand.is_finite()) {
        return Err(ConfigError::NonFinite);
    }
    if !(0.0..=1.0).contains(&cfg.relaxation_rate) {
        return Err(ConfigError::InvalidRelaxationRate);
    }
    if !cfg.recovery_cap.is_finite() || cfg.recovery_cap < 1.0 {
        return Err(ConfigError::InvalidRecoveryCap);
    }
    if !(0.0..1.0).contains(&cfg.fluctuation) {
        return Err(ConfigError::InvalidFluctuation);
    }
    if !(0.0..=1.0).contains(&cfg.global_event_chance) {
        return Err(ConfigError::InvalidEventChance);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: u16, price: u32) -> ItemDefinition {
        ItemDefinition {
            id: ItemId(id),
            name: format!("Item {id}"),
            category: ItemCategory::Material,
            rarity: Rarity::Common,
            base_price: price,
            weight_kg: 1.0,
            stack_size: 10,
        }
    }

    #[test]
    fn builtin_catalog_is_valid_and_roundtrips() {
        let catalog = ItemCatalog::builtin();
        assert!(!catalog.is_empty());
        let s = serde_json::to_string(&catalog).unwrap();
        let back: ItemCatalog = serde_json::from_str(&s).unwrap();
        assert_eq!(back.len(), catalog.len());
        assert_eq!(back.get(ItemId(1)).unwrap().name, "Grain");
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = ItemCatalog::from_items(vec![item(1, 10), item(1, 20)]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateItem(ItemId(1)));
    }

    #[test]
    fn zero_price_rejected() {
        let err = ItemCatalog::from_items(vec![item(1, 0)]).unwrap_err();
        assert_eq!(err, CatalogError::ZeroBasePrice(ItemId(1)));
    }

    #[test]
    fn seasons_cycle_in_order() {
        let day = MINUTES_PER_DAY;
        assert_eq!(season_at(0), Season::Spring);
        assert_eq!(season_at(DAYS_PER_SEASON * day), Season::Summer);
        assert_eq!(season_at(2 * DAYS_PER_SEASON * day), Season::Autumn);
        assert_eq!(season_at(3 * DAYS_PER_SEASON * day), Season::Winter);
        assert_eq!(season_at(4 * DAYS_PER_SEASON * day), Season::Spring);
    }

    #[test]
    fn morning_window() {
        assert!(!is_morning(0));
        assert!(is_morning(6 * 60));
        assert!(is_morning(11 * 60 + 59));
        assert!(!is_morning(12 * 60));
    }

    #[test]
    fn timestamps_render() {
        assert_eq!(format_timestamp(0), "day 1, 00:00");
        assert_eq!(format_timestamp(MINUTES_PER_DAY + 7 * 60 + 30), "day 2, 07:30");
    }

    #[test]
    fn default_config_is_valid() {
        validate_config(&EconomyConfig::default()).unwrap();
    }

    #[test]
    fn bad_config_rejected() {
        let cfg = EconomyConfig {
            fluctuation: 1.0,
            ..EconomyConfig::default()
        };
        assert_eq!(validate_config(&cfg), Err(ConfigError::InvalidFluctuation));
    }

    #[test]
    fn rarity_multiplier_monotonic() {
        let tiers = [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Exotic];
        for pair in tiers.windows(2) {
            assert!(pair[0].price_multiplier() < pair[1].price_multiplier());
        }
    }

    proptest! {
        #[test]
        fn catalog_accepts_positive_prices(price in 1u32..100_000) {
            let catalog = ItemCatalog::from_items(vec![item(1, price)]).unwrap();
            prop_assert_eq!(catalog.get(ItemId(1)).unwrap().base_price, price);
        }

        #[test]
        fn season_is_total(minute in 0u64..10_000_000) {
            let _ = season_at(minute);
            prop_assert!(minute_of_day(minute) < MINUTES_PER_DAY);
        }
    }
}
