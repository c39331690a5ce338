//! Per-location market state and the displayed-price pipeline.
//!
//! The pipeline is an ordered, named sequence of stages; adding or removing
//! a modifier source means editing [`stage_factors`], never reordering
//! ad-hoc multiplications at call sites.

use econ_core::{is_morning, ItemCategory, ItemDefinition};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reputation::ReputationRecord;

/// Supply and demand never drop below this floor.
pub const SUPPLY_DEMAND_FLOOR: f64 = 10.0;

/// Stock above this threshold discounts the price (oversupply).
pub const OVERSUPPLY_STOCK: u32 = 50;

/// Stock below this threshold surcharges the price (scarcity).
pub const SCARCITY_STOCK: u32 = 5;

/// One location×item record: the economic memory of a settlement for one
/// good. Entries are created at seeding or lazily and never deleted; stock
/// may sit at zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    /// Displayed price, recomputed each tick.
    pub price: u32,
    pub stock: u32,
    pub supply: f64,
    pub demand: f64,
    /// Recovery target for supply.
    pub base_supply: f64,
    /// Recovery target for demand.
    pub base_demand: f64,
    /// Present only while a city event targets this item.
    pub event_modifier: Option<f64>,
    /// Stock-derived multiplier, recomputed each tick.
    pub saturation: f64,
}

impl MarketEntry {
    pub fn seeded(stock: u32, base_supply: f64, base_demand: f64) -> Self {
        Self {
            price: 0,
            stock,
            supply: base_supply.max(SUPPLY_DEMAND_FLOOR),
            demand: base_demand.max(SUPPLY_DEMAND_FLOOR),
            base_supply: base_supply.max(SUPPLY_DEMAND_FLOOR),
            base_demand: base_demand.max(SUPPLY_DEMAND_FLOOR),
            event_modifier: None,
            saturation: 1.0,
        }
    }

    /// Apply a trade. Positive quantities are player purchases (stock
    /// leaves the market), negative are player sales.
    pub fn record_trade(&mut self, signed_qty: i64) {
        if signed_qty >= 0 {
            self.stock = self.stock.saturating_sub(signed_qty as u32);
        } else {
            self.stock = self.stock.saturating_add(signed_qty.unsigned_abs() as u32);
        }
        let qty = signed_qty as f64;
        self.supply = (self.supply - qty * 0.5).max(SUPPLY_DEMAND_FLOOR);
        self.demand = (self.demand + qty * 0.3).max(SUPPLY_DEMAND_FLOOR);
    }

    /// Exponential recovery toward base values: each tick closes `rate` of
    /// the remaining distance, capped at `cap` × base.
    pub fn relax(&mut self, rate: f64, cap: f64) {
        self.supply += rate * (self.base_supply - self.supply);
        self.supply = self
            .supply
            .clamp(SUPPLY_DEMAND_FLOOR, self.base_supply * cap);
        self.demand += rate * (self.base_demand - self.demand);
        self.demand = self
            .demand
            .clamp(SUPPLY_DEMAND_FLOOR, self.base_demand * cap);
    }

    /// Recompute the stock-derived saturation multiplier.
    pub fn recompute_saturation(&mut self) {
        self.saturation = if self.stock > OVERSUPPLY_STOCK {
            0.9
        } else if self.stock < SCARCITY_STOCK {
            1.2
        } else {
            1.0
        };
    }
}

// ---------------------------------------------------------------------------
// Pricing pipeline
// ---------------------------------------------------------------------------

/// Named pipeline stages, in application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceStage {
    SupplyDemand,
    Reputation,
    CityEvent,
    GlobalEvent,
    TimeOfDay,
    Saturation,
    Fluctuation,
}

/// Everything a price computation reads. Gathered by the engine so the
/// pipeline itself stays a pure function.
#[derive(Clone, Copy, Debug)]
pub struct PriceInputs {
    pub supply: f64,
    pub demand: f64,
    pub reputation_modifier: f64,
    pub event_modifier: f64,
    pub global_modifier: f64,
    pub time_of_day: f64,
    pub saturation: f64,
    pub fluctuation: f64,
}

/// Supply/demand step multiplier. First matching tier wins; tiers are
/// checked in table order, so keep the order when editing.
pub fn first_match_ratio_tier(supply: f64, demand: f64) -> f64 {
    let ratio = demand / supply.max(f64::MIN_POSITIVE);
    if ratio > 1.5 {
        1.3
    } else if ratio > 1.2 {
        1.15
    } else if ratio < 0.7 {
        0.8
    } else if ratio < 0.9 {
        0.9
    } else {
        1.0
    }
}

/// Time-of-day policy table, currently a single row: consumables cost 5%
/// more in the morning. A policy hook, not a universal law.
pub fn time_of_day_factor(category: ItemCategory, minute: u64) -> f64 {
    if category.is_consumable() && is_morning(minute) {
        1.05
    } else {
        1.0
    }
}

/// The ordered stage table for one computation.
pub fn stage_factors(inputs: &PriceInputs) -> [(PriceStage, f64); 7] {
    [
        (
            PriceStage::SupplyDemand,
            first_match_ratio_tier(inputs.supply, inputs.demand),
        ),
        (PriceStage::Reputation, inputs.reputation_modifier),
        (PriceStage::CityEvent, inputs.event_modifier),
        (PriceStage::GlobalEvent, inputs.global_modifier),
        (PriceStage::TimeOfDay, inputs.time_of_day),
        (PriceStage::Saturation, inputs.saturation),
        (PriceStage::Fluctuation, inputs.fluctuation),
    ]
}

/// Fold the stages over the rarity-adjusted base price. Rounds to the
/// nearest integer and floors at 1.
pub fn compose_price(base_price: u32, rarity_multiplier: f64, inputs: &PriceInputs) -> u32 {
    let mut price = f64::from(base_price) * rarity_multiplier;
    for (_, factor) in stage_factors(inputs) {
        price *= factor;
    }
    price.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Recompute one entry's displayed price, drawing a fresh fluctuation from
/// the engine RNG, and store it.
pub(crate) fn recompute_entry_price(
    def: &ItemDefinition,
    entry: &mut MarketEntry,
    reputation: &ReputationRecord,
    global_modifier: f64,
    minute: u64,
    fluctuation_half_width: f64,
    rng: &mut ChaCha8Rng,
) -> u32 {
    let fluctuation = if fluctuation_half_width > 0.0 {
        rng.gen_range(1.0 - fluctuation_half_width..=1.0 + fluctuation_half_width)
    } else {
        1.0
    };
    let inputs = PriceInputs {
        supply: entry.supply,
        demand: entry.demand,
        reputation_modifier: reputation.price_modifier(),
        event_modifier: entry.event_modifier.unwrap_or(1.0),
        global_modifier,
        time_of_day: time_of_day_factor(def.category, minute),
        saturation: entry.saturation,
        fluctuation,
    };
    entry.price = compose_price(def.base_price, def.rarity.price_multiplier(), &inputs);
    entry.price
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Which way goods move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// Player buys from the market.
    Buy,
    /// Player sells to the market.
    Sell,
}

/// Soft rejection reasons. A bad call from the UI never halts the tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TradeRejection {
    #[error("unknown location")]
    UnknownLocation,
    #[error("unknown item")]
    UnknownItem,
    #[error("quantity must be positive")]
    InvalidQuantity,
    #[error("insufficient stock: {available} available")]
    InsufficientStock { available: u32 },
}

/// Result of a trade call: the realized unit price actually charged, or a
/// rejection with the state untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum TradeOutcome {
    Filled {
        unit_price: u32,
        quantity: u32,
        /// Coins moved, as `unit_price × quantity`.
        total: Decimal,
    },
    Rejected(TradeRejection),
}

impl TradeOutcome {
    pub fn filled(unit_price: u32, quantity: u32) -> Self {
        TradeOutcome::Filled {
            unit_price,
            quantity,
            total: Decimal::from(unit_price) * Decimal::from(quantity),
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, TradeOutcome::Filled { .. })
    }
}
