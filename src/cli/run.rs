//! Handler for the `run` subcommand: build `AppState` and drive the
//! runtime's four loops until Ctrl-C.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::app::{AppState, Runtime};
use crate::config::AppConfig;
use crate::error::Result;

pub async fn execute(config_path: &Path, json_logs: bool) -> Result<()> {
    let mut config = AppConfig::load(config_path)?;
    if json_logs {
        config.logging.json = true;
    }
    config.init_logging();

    info!(venues_enabled = ?(config.venues.polymarket.enabled, config.venues.kalshi.enabled), "arbitrex starting");

    let state = Arc::new(AppState::new(config)?);
    let runtime = Runtime::new(state);
    runtime.run().await?;

    info!("arbitrex stopped");
    Ok(())
}
