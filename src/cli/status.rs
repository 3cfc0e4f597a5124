//! Handler for the `status` subcommand: print the §6 snapshot as JSON
//! against the configured store. Ingestion counters read zero here since
//! this is a fresh process, not the running one — `arbitrex run` is the
//! process that accumulates them.

use std::path::Path;

use crate::app::AppState;
use crate::config::AppConfig;
use crate::error::Result;
use crate::ingestion::IngestionStats;

pub async fn execute(config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let state = AppState::new(config)?;
    let stats = IngestionStats::default();

    let snapshot = state.status_snapshot(&stats).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
