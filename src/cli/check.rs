//! Handler for the `check` subcommand: validate configuration, then probe
//! every enabled venue with a single `fetch_active_markets` call.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::Result;
use crate::exchange::AdapterRegistry;

use super::output;

pub async fn execute(config_path: &Path) -> Result<()> {
    output::section("Configuration");
    let config = match AppConfig::load(config_path) {
        Ok(config) => {
            output::success(&format!("loaded {}", config_path.display()));
            config
        }
        Err(error) => {
            output::error(&format!("{error}"));
            return Err(error);
        }
    };
    output::field("Polymarket", if config.venues.polymarket.enabled { "enabled" } else { "disabled" });
    output::field("Kalshi", if config.venues.kalshi.enabled { "enabled" } else { "disabled" });
    output::field("Database", &config.database.path);

    output::section("Venue reachability");
    let adapters = AdapterRegistry::from_config(&config);
    let mut all_ok = true;
    for venue in adapters.venues() {
        let Some(adapter) = adapters.get(venue) else {
            continue;
        };
        match adapter.fetch_active_markets().await {
            Ok((markets, latency_ms)) => {
                output::success(&format!("{venue}: {} active markets ({latency_ms} ms)", markets.len()));
            }
            Err(error) => {
                all_ok = false;
                output::error(&format!("{venue}: {error}"));
            }
        }
    }

    if all_ok {
        output::success("all checks passed");
        Ok(())
    } else {
        Err(crate::error::Error::Other("one or more venue checks failed".to_string()))
    }
}
