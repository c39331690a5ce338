//! Shared event-effect vocabulary and the named-contribution modifier ledger.
//!
//! Effects are tagged variants applied by one generic routine per engine;
//! there is no string-keyed dispatch. World-scoped modifiers live in a
//! [`ModifierLedger`] so removing an effect deletes its contribution by
//! source id instead of relying on a multiply/divide pair to cancel.

use econ_core::{ItemCategory, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a triggered event instance, used to tie modifier
/// contributions back to their source for exact reversal.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Which market entries a price effect touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectScope {
    /// Every entry at the event's location.
    All,
    /// Entries whose item belongs to the category.
    Category(ItemCategory),
    /// A single item.
    Item(ItemId),
}

impl EffectScope {
    /// Whether an item with the given id and category falls in scope.
    pub fn matches(&self, item: ItemId, category: ItemCategory) -> bool {
        match self {
            EffectScope::All => true,
            EffectScope::Category(c) => *c == category,
            EffectScope::Item(i) => *i == item,
        }
    }
}

/// One effect carried by an event kind. `value` fields are fractional
/// deltas: `0.15` means ×1.15, `-0.10` means ×0.90.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventEffect {
    /// Multiplicative price delta on matching entries at the event's
    /// location.
    Price { scope: EffectScope, value: f64 },
    /// Standing shift at the event's location. Not reversed at expiry.
    Reputation { delta: i32 },
    /// Lazily stock special goods appropriate to the player's access tier.
    /// The created entries outlive the event.
    UnlockSpecialGoods,
    /// Contribution to the world market price ledger.
    GlobalPrice { value: f64 },
    /// Contribution to the world travel speed ledger.
    TravelSpeed { value: f64 },
}

/// What one applied event actually touched, recorded at trigger time so
/// expiry reverses exactly that and nothing else.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectFootprint {
    /// Items whose `event_modifier` this event set.
    pub items: Vec<ItemId>,
    /// Whether the event contributed to the world price ledger.
    pub price_ledger: bool,
    /// Whether the event contributed to the world travel ledger.
    pub travel_ledger: bool,
}

impl EffectFootprint {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && !self.price_ledger && !self.travel_ledger
    }
}

/// A single named contribution to a world-scoped modifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Contribution {
    source: EventId,
    value: f64,
}

/// Multiset of named contributions to one modifier target. The effective
/// factor is the product of `1 + value` over live contributions and is
/// recomputed on every read.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierLedger {
    contributions: Vec<Contribution>,
}

impl ModifierLedger {
    /// Record a contribution from `source`.
    pub fn contribute(&mut self, source: EventId, value: f64) {
        self.contributions.push(Contribution { source, value });
    }

    /// Remove every contribution from `source`. Returns true if at least
    /// one was present; the caller asserts on reversal of a contribution
    /// that was never made.
    pub fn retract(&mut self, source: EventId) -> bool {
        let before = self.contributions.len();
        self.contributions.retain(|c| c.source != source);
        self.contributions.len() != before
    }

    /// Effective multiplicative factor.
    pub fn factor(&self) -> f64 {
        self.contributions
            .iter()
            .fold(1.0, |acc, c| acc * (1.0 + c.value))
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}
