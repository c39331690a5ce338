//! World-scoped events and scheduled signals.
//!
//! Global events share the city-event lifecycle but apply to the whole
//! world through named ledger contributions. The same timer also drives
//! directly scheduled non-economic signals ("travel arrived").

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::{EffectFootprint, EventEffect, EventId, ModifierLedger};
use crate::Economy;

/// A registered global event type. Selection is one roll per tick: if it
/// succeeds, a uniformly random kind from the table triggers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalEventKind {
    pub name: String,
    pub duration_minutes: u64,
    pub effects: Vec<EventEffect>,
}

/// A triggered global event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveGlobalEvent {
    pub id: EventId,
    pub name: String,
    pub started_at: u64,
    pub duration_minutes: u64,
    pub footprint: EffectFootprint,
}

impl ActiveGlobalEvent {
    pub fn expires_at(&self) -> u64 {
        self.started_at + self.duration_minutes
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.expires_at().saturating_sub(now)
    }
}

/// A directly scheduled signal: fires a notification at its minute and is
/// removed. The engine never interprets the payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSignal {
    pub id: EventId,
    pub label: String,
    pub at_minute: u64,
    pub payload: String,
}

/// World-scoped mutable state: active events, the two modifier ledgers,
/// and pending scheduled signals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
    pub active: Vec<ActiveGlobalEvent>,
    pub price: ModifierLedger,
    pub travel: ModifierLedger,
    pub scheduled: Vec<ScheduledSignal>,
}

/// The default global event table.
pub fn builtin_global_kinds() -> Vec<GlobalEventKind> {
    vec![
        GlobalEventKind {
            name: "Market Boom".to_string(),
            duration_minutes: 2880,
            effects: vec![EventEffect::GlobalPrice { value: 0.10 }],
        },
        GlobalEventKind {
            name: "Market Crash".to_string(),
            duration_minutes: 2880,
            effects: vec![EventEffect::GlobalPrice { value: -0.15 }],
        },
        GlobalEventKind {
            name: "Great Storm".to_string(),
            duration_minutes: 1440,
            effects: vec![
                EventEffect::TravelSpeed { value: -0.25 },
                EventEffect::GlobalPrice { value: 0.05 },
            ],
        },
        GlobalEventKind {
            name: "Fair Winds".to_string(),
            duration_minutes: 1440,
            effects: vec![EventEffect::TravelSpeed { value: 0.20 }],
        },
    ]
}

impl Economy {
    /// Currently active global events.
    pub fn active_global_events(&self) -> &[ActiveGlobalEvent] {
        &self.state.global.active
    }

    /// Effective world market price factor.
    pub fn market_price_modifier(&self) -> f64 {
        self.state.global.price.factor()
    }

    /// Effective world travel speed factor, read by the travel system.
    pub fn travel_speed_modifier(&self) -> f64 {
        self.state.global.travel.factor()
    }

    /// Schedule a non-economic signal to fire at an absolute minute.
    pub fn schedule_signal(
        &mut self,
        label: impl Into<String>,
        at_minute: u64,
        payload: impl Into<String>,
    ) -> EventId {
        let id = self.next_event_id();
        self.state.global.scheduled.push(ScheduledSignal {
            id,
            label: label.into(),
            at_minute,
            payload: payload.into(),
        });
        id
    }

    pub(crate) fn trigger_global_event(&mut self, kind: &GlobalEventKind) {
        let id = self.next_event_id();
        let now = self.state.clock_minutes;
        let footprint = self.apply_effects(id, None, &kind.effects);
        info!(target: "global_event", name = %kind.name, %id, "event triggered");
        self.state.global.active.push(ActiveGlobalEvent {
            id,
            name: kind.name.clone(),
            started_at: now,
            duration_minutes: kind.duration_minutes,
            footprint,
        });
        self.notifications
            .push(crate::Notification::GlobalEventStarted {
                name: kind.name.clone(),
            });
    }

    /// Stage-1 expiry for the world scope: retract due events' ledger
    /// contributions and fire due scheduled signals.
    pub(crate) fn expire_due_global_events(&mut self, now: u64) {
        let mut due = Vec::new();
        self.state.global.active.retain(|event| {
            if now >= event.expires_at() {
                due.push(event.clone());
                false
            } else {
                true
            }
        });
        for event in due {
            self.retract_effects(event.id, None, &event.footprint);
            info!(target: "global_event", name = %event.name, id = %event.id, "event expired");
            self.notifications
                .push(crate::Notification::GlobalEventEnded { name: event.name });
        }

        let mut fired = Vec::new();
        self.state.global.scheduled.retain(|signal| {
            if now >= signal.at_minute {
                fired.push(signal.clone());
                false
            } else {
                true
            }
        });
        for signal in fired {
            info!(target: "global_event", label = %signal.label, "scheduled signal fired");
            self.notifications.push(crate::Notification::SignalFired {
                label: signal.label,
                payload: signal.payload,
            });
        }
    }

    pub(crate) fn roll_global_event(&mut self) {
        use rand::Rng;
        if self.global_kinds.is_empty() {
            return;
        }
        if self.rng.gen::<f64>() >= self.config.global_event_chance {
            return;
        }
        let idx = self.rng.gen_range(0..self.global_kinds.len());
        let kind = self.global_kinds[idx].clone();
        self.trigger_global_event(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_well_formed() {
        let kinds = builtin_global_kinds();
        assert!(!kinds.is_empty());
        for k in &kinds {
            assert!(k.duration_minutes > 0, "{}", k.name);
            assert!(!k.effects.is_empty(), "{}", k.name);
        }
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let event = ActiveGlobalEvent {
            id: EventId(1),
            name: "Market Boom".to_string(),
            started_at: 100,
            duration_minutes: 50,
            footprint: EffectFootprint::default(),
        };
        assert_eq!(event.remaining(100), 50);
        assert_eq!(event.remaining(149), 1);
        assert_eq!(event.remaining(200), 0);
    }
}
