//! Outbound notification stream and price-alert watches.
//!
//! The engine queues notifications during trades and ticks; the host
//! drains them after each call and decides how to surface them. Nothing in
//! here blocks or calls out.

use econ_core::{ItemId, LocationId};
use serde::{Deserialize, Serialize};

/// Side of a price threshold a watch waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchDirection {
    /// Fire when the price rises to or above the threshold.
    Above,
    /// Fire when the price falls to or below the threshold.
    Below,
}

/// A registered price alert. Watches persist and fire on every crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceWatch {
    pub location: LocationId,
    pub item: ItemId,
    pub threshold: u32,
    pub direction: WatchDirection,
}

impl PriceWatch {
    fn satisfied_by(&self, price: u32) -> bool {
        match self.direction {
            WatchDirection::Above => price >= self.threshold,
            WatchDirection::Below => price <= self.threshold,
        }
    }

    /// A watch fires on the tick where the price moves from the wrong side
    /// of the threshold to the right one.
    pub fn crossed(&self, old_price: u32, new_price: u32) -> bool {
        !self.satisfied_by(old_price) && self.satisfied_by(new_price)
    }
}

/// Everything the presentation layer may want to surface as a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    CityEventStarted {
        location: LocationId,
        name: String,
    },
    CityEventEnded {
        location: LocationId,
        name: String,
    },
    GlobalEventStarted {
        name: String,
    },
    GlobalEventEnded {
        name: String,
    },
    ReputationChanged {
        location: LocationId,
        /// Signed change actually applied after clamping.
        delta: i32,
        standing: i32,
    },
    PriceAlert {
        location: LocationId,
        item: ItemId,
        price: u32,
        threshold: u32,
        direction: WatchDirection,
    },
    /// A scheduled non-economic signal came due.
    SignalFired {
        label: String,
        payload: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_fires_only_on_crossing() {
        let watch = PriceWatch {
            location: LocationId(1),
            item: ItemId(1),
            threshold: 100,
            direction: WatchDirection::Above,
        };
        assert!(watch.crossed(90, 100));
        assert!(watch.crossed(99, 150));
        assert!(!watch.crossed(100, 150)); // already satisfied
        assert!(!watch.crossed(90, 99));

        let watch = PriceWatch {
            direction: WatchDirection::Below,
            ..watch
        };
        assert!(watch.crossed(110, 100));
        assert!(!watch.crossed(100, 90)); // already satisfied
        assert!(!watch.crossed(110, 101));
    }
}
