//! Human-readable market news: active events and notable price trends,
//! rendered for the "market news" display.

use std::fmt::Write;

use econ_core::format_timestamp;

use crate::history::Trend;
use crate::Economy;

/// Trend lines included before the digest truncates.
const MAX_TREND_LINES: usize = 10;

impl Economy {
    /// Render a digest of everything currently newsworthy.
    pub fn news_digest(&self) -> String {
        let now = self.state.clock_minutes;
        let mut out = String::new();
        let _ = writeln!(out, "Market news, {}", format_timestamp(now));

        let mut newsworthy = false;
        for event in &self.state.global.active {
            newsworthy = true;
            let _ = writeln!(
                out,
                "  [world] {} ({} min remaining)",
                event.name,
                event.remaining(now)
            );
        }
        for locst in self.state.locations.values() {
            if let Some(event) = &locst.active_event {
                newsworthy = true;
                let _ = writeln!(
                    out,
                    "  [{}] {} ({} min remaining)",
                    locst.name,
                    event.name,
                    event.remaining(now)
                );
            }
        }

        let mut trend_lines = 0usize;
        let mut truncated = 0usize;
        for (loc, locst) in &self.state.locations {
            for (item, entry) in &locst.entries {
                let trend = self.state.history.trend(*loc, *item);
                if trend == Trend::Stable {
                    continue;
                }
                newsworthy = true;
                if trend_lines >= MAX_TREND_LINES {
                    truncated += 1;
                    continue;
                }
                trend_lines += 1;
                let name = self
                    .catalog
                    .get(*item)
                    .map_or_else(|| item.to_string(), |d| d.name.clone());
                let _ = writeln!(
                    out,
                    "  [{}] {} at {} coins and {}",
                    locst.name,
                    name,
                    entry.price,
                    trend.label()
                );
            }
        }
        if truncated > 0 {
            let _ = writeln!(out, "  ({truncated} more items on the move)");
        }

        if !newsworthy {
            let _ = writeln!(out, "  All quiet on the trade routes.");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use econ_core::{EconomyConfig, ItemCatalog, ItemId};

    use crate::Economy;

    #[test]
    fn quiet_world_reports_quiet() {
        let config = EconomyConfig {
            fluctuation: 0.0,
            global_event_chance: 0.0,
            ..EconomyConfig::default()
        };
        let mut eco = Economy::new(ItemCatalog::builtin(), config)
            .unwrap()
            .with_event_tables(Vec::new(), Vec::new());
        let loc = eco.add_location("Saltmarsh");
        eco.seed_location(loc, &[(ItemId(1), 10)]);
        eco.tick(3);
        let digest = eco.news_digest();
        assert!(digest.starts_with("Market news"));
        assert!(digest.contains("All quiet"));
    }

    #[test]
    fn falling_prices_make_the_news() {
        let config = EconomyConfig {
            fluctuation: 0.0,
            global_event_chance: 0.0,
            ..EconomyConfig::default()
        };
        let mut eco = Economy::new(ItemCatalog::builtin(), config)
            .unwrap()
            .with_event_tables(Vec::new(), Vec::new());
        let loc = eco.add_location("Saltmarsh");
        eco.seed_location(loc, &[(ItemId(1), 10)]);
        // Flood the market; the trend window must still contain the drop.
        for _ in 0..5 {
            eco.trade(loc, ItemId(1), 20, crate::TradeDirection::Sell);
            eco.tick(1);
        }
        let digest = eco.news_digest();
        assert!(digest.contains("Grain"), "digest was: {digest}");
        assert!(digest.contains("falling"), "digest was: {digest}");
    }
}
