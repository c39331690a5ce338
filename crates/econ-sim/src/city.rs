//! Per-location events: Idle → Active → Idle, at most one active event per
//! settlement, effects applied once at trigger and reversed once at expiry.

use econ_core::{LocationId, Season};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::{EffectFootprint, EffectScope, EventEffect, EventId};
use crate::Economy;

/// A registered city event type. Kinds are walked in table order when
/// rolling; see [`first_match_city_kind`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityEventKind {
    pub name: String,
    /// Independent trigger probability, evaluated once per tick.
    pub chance: f64,
    /// Some kinds only fire in a season.
    pub season: Option<Season>,
    pub duration_minutes: u64,
    /// Applied in declared order; every effect applies (no first-match
    /// here, unlike kind selection).
    pub effects: Vec<EventEffect>,
}

/// A triggered city event, carrying exactly what must be reversed at
/// expiry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveCityEvent {
    pub id: EventId,
    pub name: String,
    /// Absolute simulated minute of the trigger.
    pub started_at: u64,
    pub duration_minutes: u64,
    pub footprint: EffectFootprint,
}

impl ActiveCityEvent {
    pub fn expires_at(&self) -> u64 {
        self.started_at + self.duration_minutes
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.expires_at().saturating_sub(now)
    }
}

/// The default city event table.
pub fn builtin_city_kinds() -> Vec<CityEventKind> {
    use econ_core::ItemCategory::*;
    vec![
        CityEventKind {
            name: "Harvest Festival".to_string(),
            chance: 0.0030,
            season: Some(Season::Autumn),
            duration_minutes: 720,
            effects: vec![
                EventEffect::Price {
                    scope: EffectScope::Category(Food),
                    value: -0.20,
                },
                EventEffect::Reputation { delta: 3 },
            ],
        },
        CityEventKind {
            name: "Market Fair".to_string(),
            chance: 0.0020,
            season: None,
            duration_minutes: 720,
            effects: vec![
                EventEffect::Price {
                    scope: EffectScope::All,
                    value: -0.10,
                },
                EventEffect::Reputation { delta: 2 },
            ],
        },
        CityEventKind {
            name: "Bandit Raid".to_string(),
            chance: 0.0010,
            season: None,
            duration_minutes: 1440,
            effects: vec![
                EventEffect::Price {
                    scope: EffectScope::All,
                    value: 0.15,
                },
                EventEffect::Reputation { delta: -2 },
            ],
        },
        CityEventKind {
            name: "Drought".to_string(),
            chance: 0.0015,
            season: Some(Season::Summer),
            duration_minutes: 2880,
            effects: vec![
                EventEffect::Price {
                    scope: EffectScope::Category(Food),
                    value: 0.25,
                },
                EventEffect::Price {
                    scope: EffectScope::Category(Drink),
                    value: 0.15,
                },
            ],
        },
        CityEventKind {
            name: "Merchant Caravan".to_string(),
            chance: 0.0020,
            season: None,
            duration_minutes: 360,
            effects: vec![
                EventEffect::UnlockSpecialGoods,
                EventEffect::Price {
                    scope: EffectScope::Category(Luxury),
                    value: -0.10,
                },
            ],
        },
    ]
}

/// Walk the kind table in order; the first kind whose roll succeeds (and
/// whose season requirement matches) wins. Table order is the tie break.
pub fn first_match_city_kind<'a>(
    kinds: &'a [CityEventKind],
    season: Season,
    rng: &mut ChaCha8Rng,
) -> Option<&'a CityEventKind> {
    for kind in kinds {
        if let Some(required) = kind.season {
            if required != season {
                continue;
            }
        }
        if rng.gen::<f64>() < kind.chance {
            return Some(kind);
        }
    }
    None
}

impl Economy {
    /// Active event at a location, if any.
    pub fn active_event(&self, location: LocationId) -> Option<&ActiveCityEvent> {
        self.state
            .locations
            .get(&location)?
            .active_event
            .as_ref()
    }

    /// Trigger `kind` at `location` now. Applies its effects exactly once
    /// and records the footprint for exact reversal.
    pub(crate) fn trigger_city_event(&mut self, location: LocationId, kind: &CityEventKind) {
        if !self.state.locations.contains_key(&location) {
            return;
        }
        let id = self.next_event_id();
        let now = self.state.clock_minutes;
        let footprint = self.apply_effects(id, Some(location), &kind.effects);
        let event = ActiveCityEvent {
            id,
            name: kind.name.clone(),
            started_at: now,
            duration_minutes: kind.duration_minutes,
            footprint,
        };
        if let Some(locst) = self.state.locations.get_mut(&location) {
            debug_assert!(
                locst.active_event.is_none(),
                "second active event at {location}"
            );
            info!(target: "city_event", %location, name = %kind.name, %id, "event triggered");
            locst.active_event = Some(event);
            self.notifications
                .push(crate::Notification::CityEventStarted {
                    location,
                    name: kind.name.clone(),
                });
        }
    }

    /// Stage-1 expiry: remove events past their duration and reverse their
    /// footprints. Runs before rollout and before price recomputation.
    pub(crate) fn expire_due_city_events(&mut self, now: u64) {
        let due: Vec<(LocationId, ActiveCityEvent)> = self
            .state
            .locations
            .iter_mut()
            .filter_map(|(loc, locst)| {
                let expired = locst
                    .active_event
                    .as_ref()
                    .is_some_and(|e| now >= e.expires_at());
                if expired {
                    locst.active_event.take().map(|e| (*loc, e))
                } else {
                    None
                }
            })
            .collect();
        for (location, event) in due {
            self.retract_effects(event.id, Some(location), &event.footprint);
            info!(target: "city_event", %location, name = %event.name, id = %event.id, "event expired");
            self.notifications
                .push(crate::Notification::CityEventEnded {
                    location,
                    name: event.name,
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn kind(name: &str, chance: f64, season: Option<Season>) -> CityEventKind {
        CityEventKind {
            name: name.to_string(),
            chance,
            season,
            duration_minutes: 60,
            effects: vec![],
        }
    }

    #[test]
    fn first_match_honors_table_order() {
        let kinds = vec![kind("a", 1.0, None), kind("b", 1.0, None)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let picked = first_match_city_kind(&kinds, Season::Spring, &mut rng).unwrap();
        assert_eq!(picked.name, "a");
    }

    #[test]
    fn season_requirement_gates_kinds() {
        let kinds = vec![kind("winter-only", 1.0, Some(Season::Winter))];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(first_match_city_kind(&kinds, Season::Summer, &mut rng).is_none());
        assert!(first_match_city_kind(&kinds, Season::Winter, &mut rng).is_some());
    }

    #[test]
    fn zero_chance_never_fires() {
        let kinds = vec![kind("never", 0.0, None)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(first_match_city_kind(&kinds, Season::Spring, &mut rng).is_none());
        }
    }

    #[test]
    fn builtin_table_is_well_formed() {
        let kinds = builtin_city_kinds();
        assert!(!kinds.is_empty());
        for k in &kinds {
            assert!(k.chance >= 0.0 && k.chance < 1.0, "{}", k.name);
            assert!(k.duration_minutes > 0, "{}", k.name);
        }
    }
}
