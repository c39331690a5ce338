#![deny(warnings)]

//! Headless CLI: seeds a small trading world, simulates N days, and prints
//! market reports plus the news digest.

use anyhow::Result;
use econ_core::{format_timestamp, EconomyConfig, ItemCatalog, ItemId};
use econ_sim::{Economy, TradeDirection, TradeOutcome};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    days: u64,
    seed: u64,
    save: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        days: 3,
        seed: 42,
        save: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--days" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.days = v;
                }
            }
            "--seed" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.seed = v;
                }
            }
            "--save" => args.save = it.next(),
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(days = args.days, seed = args.seed, "starting CLI");

    let config = EconomyConfig {
        rng_seed: args.seed,
        ..EconomyConfig::default()
    };
    let mut economy = Economy::new(ItemCatalog::builtin(), config)?;
    let locations: Vec<_> = ["Saltmarsh", "Highmoor", "Port Respite"]
        .into_iter()
        .map(|name| economy.add_location(name))
        .collect();
    for &loc in &locations {
        economy.visit_location(loc);
    }

    // A scripted trader: buy grain where it is cheap each morning, sell
    // where it is dear, and let the clock run in between.
    let grain = ItemId(1);
    let mut hauled = 0u32;
    let mut spent = Decimal::ZERO;
    let mut earned = Decimal::ZERO;
    for day in 0..args.days {
        economy.tick(8 * 60); // overnight to 08:00

        let reports = economy.compare_across_locations(grain);
        if let (Some(cheapest), Some(dearest)) = (reports.first(), reports.last()) {
            let (buy_at, sell_at) = (cheapest.location, dearest.location);
            if let TradeOutcome::Filled {
                quantity, total, ..
            } = economy.trade(buy_at, grain, 5, TradeDirection::Buy)
            {
                hauled += quantity;
                spent += total;
            }
            if hauled > 0 {
                if let TradeOutcome::Filled { total, .. } =
                    economy.trade(sell_at, grain, hauled, TradeDirection::Sell)
                {
                    earned += total;
                    hauled = 0;
                }
            }
        }

        economy.tick(16 * 60); // rest of the day
        info!(day, "day simulated");
    }

    for &loc in &locations {
        if let Some(snapshot) = economy.market_snapshot(loc) {
            println!(
                "{} | standing {} (tier {})",
                snapshot.name, snapshot.standing, snapshot.access_level
            );
            for entry in &snapshot.entries {
                println!(
                    "  {:<14} {:>5} coins | stock {:>3} | {}",
                    entry.name,
                    entry.price,
                    entry.stock,
                    entry.trend.label()
                );
            }
        }
    }

    println!();
    print!("{}", economy.news_digest());
    println!(
        "Ledger | {} | spent {} | earned {} | world price x{:.2} | travel x{:.2}",
        format_timestamp(economy.clock_minutes()),
        spent,
        earned,
        economy.market_price_modifier(),
        economy.travel_speed_modifier()
    );

    let events = economy.drain_notifications();
    println!("Notifications drained: {}", events.len());

    if let Some(path) = args.save {
        persistence::save_json(&economy, &path)?;
        println!("Saved to {path}");
    }

    Ok(())
}
