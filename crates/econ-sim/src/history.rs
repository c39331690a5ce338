//! Bounded per-(location, item) price series, the source of trend
//! classification and trailing averages.

use econ_core::{ItemId, LocationId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Snapshots kept per series; oldest evicted first.
pub const HISTORY_CAP: usize = 50;

/// Snapshots examined for trend classification.
pub const TREND_WINDOW: usize = 5;

/// Relative change beyond which a trend counts as rising/falling.
pub const TREND_THRESHOLD: f64 = 0.10;

/// One realized price observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub price: u32,
    /// Absolute simulated minute.
    pub minute: u64,
}

/// Recent price direction for one series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
        }
    }
}

/// FIFO price series per (location, item), capped at [`HISTORY_CAP`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    series: BTreeMap<LocationId, BTreeMap<ItemId, VecDeque<PriceSnapshot>>>,
}

impl PriceHistory {
    /// Append a snapshot, evicting the oldest once the cap is exceeded.
    pub fn record(&mut self, location: LocationId, item: ItemId, price: u32, minute: u64) {
        let series = self
            .series
            .entry(location)
            .or_default()
            .entry(item)
            .or_default();
        series.push_back(PriceSnapshot { price, minute });
        while series.len() > HISTORY_CAP {
            series.pop_front();
        }
    }

    pub fn len(&self, location: LocationId, item: ItemId) -> usize {
        self.get(location, item).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, location: LocationId, item: ItemId) -> bool {
        self.len(location, item) == 0
    }

    fn get(&self, location: LocationId, item: ItemId) -> Option<&VecDeque<PriceSnapshot>> {
        self.series.get(&location)?.get(&item)
    }

    /// Oldest snapshot still held, if any.
    pub fn oldest(&self, location: LocationId, item: ItemId) -> Option<PriceSnapshot> {
        self.get(location, item)?.front().copied()
    }

    /// Classify the last [`TREND_WINDOW`] snapshots. Fewer than two
    /// observations are always `Stable`; otherwise the first and last of
    /// the window are compared against [`TREND_THRESHOLD`].
    pub fn trend(&self, location: LocationId, item: ItemId) -> Trend {
        let Some(series) = self.get(location, item) else {
            return Trend::Stable;
        };
        let window: Vec<PriceSnapshot> = series
            .iter()
            .rev()
            .take(TREND_WINDOW)
            .rev()
            .copied()
            .collect();
        if window.len() < 2 {
            return Trend::Stable;
        }
        let first = f64::from(window[0].price);
        let last = f64::from(window[window.len() - 1].price);
        if first <= 0.0 {
            return Trend::Stable;
        }
        let change = (last - first) / first;
        if change > TREND_THRESHOLD {
            Trend::Rising
        } else if change < -TREND_THRESHOLD {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }

    /// Mean of snapshots with `minute >= now - window_minutes`; 0 if none.
    pub fn average(
        &self,
        location: LocationId,
        item: ItemId,
        now: u64,
        window_minutes: u64,
    ) -> f64 {
        let Some(series) = self.get(location, item) else {
            return 0.0;
        };
        let cutoff = now.saturating_sub(window_minutes);
        let recent: Vec<u32> = series
            .iter()
            .filter(|s| s.minute >= cutoff)
            .map(|s| s.price)
            .collect();
        if recent.is_empty() {
            return 0.0;
        }
        recent.iter().map(|&p| f64::from(p)).sum::<f64>() / recent.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOC: LocationId = LocationId(1);
    const ITEM: ItemId = ItemId(1);

    fn history_of(prices: &[u32]) -> PriceHistory {
        let mut history = PriceHistory::default();
        for (i, &p) in prices.iter().enumerate() {
            history.record(LOC, ITEM, p, i as u64);
        }
        history
    }

    #[test]
    fn trend_classification_thresholds() {
        assert_eq!(history_of(&[100, 100, 100, 100, 115]).trend(LOC, ITEM), Trend::Rising);
        assert_eq!(history_of(&[100, 100, 100, 100, 85]).trend(LOC, ITEM), Trend::Falling);
        assert_eq!(history_of(&[100, 101, 99, 100, 100]).trend(LOC, ITEM), Trend::Stable);
    }

    #[test]
    fn short_series_are_stable() {
        assert_eq!(PriceHistory::default().trend(LOC, ITEM), Trend::Stable);
        assert_eq!(history_of(&[100]).trend(LOC, ITEM), Trend::Stable);
    }

    #[test]
    fn trend_window_ignores_older_snapshots() {
        // 10 old high prices, then a flat recent window: stable.
        let mut prices = vec![500; 10];
        prices.extend([100, 100, 100, 100, 100]);
        assert_eq!(history_of(&prices).trend(LOC, ITEM), Trend::Stable);
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let prices: Vec<u32> = (0..60).collect();
        let history = history_of(&prices);
        assert_eq!(history.len(LOC, ITEM), HISTORY_CAP);
        // The 10 oldest snapshots (minutes 0..10) are gone.
        assert_eq!(history.oldest(LOC, ITEM).unwrap().minute, 10);
    }

    #[test]
    fn average_respects_window() {
        let mut history = PriceHistory::default();
        history.record(LOC, ITEM, 100, 0);
        history.record(LOC, ITEM, 200, 50);
        history.record(LOC, ITEM, 300, 100);
        // Window covering the last two snapshots only.
        assert_eq!(history.average(LOC, ITEM, 100, 50), 250.0);
        // Window covering everything.
        assert_eq!(history.average(LOC, ITEM, 100, 1000), 200.0);
        // No snapshots in window.
        assert_eq!(history.average(LOC, ITEM, 1000, 10), 0.0);
        // Unknown series.
        assert_eq!(history.average(LOC, ItemId(9), 100, 100), 0.0);
    }
}
