//! Shared application state: every collaborator the four independent loops
//! and the CLI need, wired once at startup from an `AppConfig`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::arbitrage::Detector;
use crate::cache::OrderBookCache;
use crate::config::AppConfig;
use crate::error::Result;
use crate::exchange::AdapterRegistry;
use crate::ingestion::IngestionOrchestrator;
use crate::matching::Matcher;
use crate::status::{self, NullPushBus, PushBus, StatusSnapshot};
use crate::store::sqlite::{
    SqliteMarketStore, SqliteMatchStore, SqliteOpportunityStore, SqliteSnapshotStore,
};
use crate::store::{create_pool, DbPool, MarketStore, MatchStore, OpportunityStore, SnapshotStore};

/// Everything a running process needs: the adapter set, the in-memory
/// order-book cache, the four store trait objects, and the push-bus
/// collaborator notified of ingestion events.
pub struct AppState {
    pub config: AppConfig,
    pub adapters: Arc<AdapterRegistry>,
    pub cache: Arc<OrderBookCache>,
    pub markets: Arc<dyn MarketStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub matches: Arc<dyn MatchStore>,
    pub opportunities: Arc<dyn OpportunityStore>,
    pub push_bus: Arc<dyn PushBus>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the SQLite-backed stores and adapter registry described by
    /// `config`, defaulting the push bus to a no-op sink.
    pub fn new(config: AppConfig) -> Result<Self> {
        let pool = create_pool(&config.database.path)?;
        Self::with_pool(config, pool, Arc::new(NullPushBus))
    }

    /// Build from an already-open pool and an explicit push-bus
    /// collaborator. Used by the CLI (to share one pool across subcommands)
    /// and by tests (to point at an in-memory database).
    pub fn with_pool(config: AppConfig, pool: DbPool, push_bus: Arc<dyn PushBus>) -> Result<Self> {
        let adapters = Arc::new(AdapterRegistry::from_config(&config));
        Ok(Self {
            adapters,
            cache: Arc::new(OrderBookCache::new()),
            markets: Arc::new(SqliteMarketStore::new(pool.clone())),
            snapshots: Arc::new(SqliteSnapshotStore::new(pool.clone())),
            matches: Arc::new(SqliteMatchStore::new(pool.clone())),
            opportunities: Arc::new(SqliteOpportunityStore::new(pool)),
            push_bus,
            config,
            started_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn ingestion_orchestrator(&self) -> IngestionOrchestrator {
        IngestionOrchestrator::new(
            self.adapters.clone(),
            self.cache.clone(),
            self.markets.clone(),
            self.snapshots.clone(),
        )
    }

    #[must_use]
    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.markets.clone(), self.matches.clone())
    }

    #[must_use]
    pub fn detector(&self) -> Detector {
        Detector::new(
            self.cache.clone(),
            self.markets.clone(),
            self.matches.clone(),
            self.opportunities.clone(),
            self.push_bus.clone(),
            self.config.thresholds,
        )
    }

    /// Build the §6 status snapshot against an already-running
    /// `IngestionOrchestrator`'s counters.
    pub async fn status_snapshot(
        &self,
        ingestion_stats: &crate::ingestion::IngestionStats,
    ) -> Result<StatusSnapshot> {
        status::build_snapshot(
            &self.adapters,
            ingestion_stats,
            self.markets.as_ref(),
            self.matches.as_ref(),
            self.opportunities.as_ref(),
            self.started_at,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.path = ":memory:".to_string();
        config
    }

    #[test]
    fn builds_state_with_both_venues_enabled() {
        let state = AppState::new(test_config()).expect("state builds");
        assert_eq!(state.adapters.venues().len(), 2);
    }

    #[tokio::test]
    async fn status_snapshot_reflects_empty_stores() {
        let state = AppState::new(test_config()).expect("state builds");
        let stats = crate::ingestion::IngestionStats::default();
        let snapshot = state.status_snapshot(&stats).await.expect("snapshot builds");
        assert_eq!(snapshot.platforms.len(), 2);
        assert_eq!(snapshot.arbitrage.active_count, 0);
    }
}
