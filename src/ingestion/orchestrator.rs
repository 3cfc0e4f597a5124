//! The ingestion orchestrator: full sync, targeted refresh, and the event
//! fan-in loop that writes adapter updates through to the cache and store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::OrderBookCache;
use crate::domain::{DenormalizedQuote, MarketId, Venue};
use crate::error::Result;
use crate::exchange::{AdapterRegistry, VenueAdapter};
use crate::store::{MarketStore, SnapshotStore};

use super::events::IngestionEvent;

const SNAPSHOT_TRAIL_LEN: usize = 200;
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Running counters surfaced by `status::StatusSnapshot`.
#[derive(Debug, Default)]
pub struct IngestionStats {
    markets_ingested: AtomicU64,
    orderbooks_updated: AtomicU64,
    quotes_updated: AtomicU64,
    errors_count: AtomicU64,
    last_full_sync_at: RwLock<Option<DateTime<Utc>>>,
}

impl IngestionStats {
    #[must_use]
    pub fn markets_ingested(&self) -> u64 {
        self.markets_ingested.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn orderbooks_updated(&self) -> u64 {
        self.orderbooks_updated.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn quotes_updated(&self) -> u64 {
        self.quotes_updated.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn last_full_sync_at(&self) -> Option<DateTime<Utc>> {
        *self.last_full_sync_at.read()
    }
}

/// Owns the adapters and the typed event channel fed by their push/poll
/// workers, writing every update through to the cache and the store.
pub struct IngestionOrchestrator {
    adapters: Arc<AdapterRegistry>,
    cache: Arc<OrderBookCache>,
    market_store: Arc<dyn MarketStore>,
    snapshot_store: Arc<dyn SnapshotStore>,
    stats: Arc<IngestionStats>,
    /// Tracks the timestamp of the last applied update per market so
    /// out-of-order arrivals within one `(venue, external_id)` stream are
    /// dropped rather than applied, per the ordering guarantee in §4.D.
    last_applied: RwLock<HashMap<MarketId, DateTime<Utc>>>,
}

impl IngestionOrchestrator {
    #[must_use]
    pub fn new(
        adapters: Arc<AdapterRegistry>,
        cache: Arc<OrderBookCache>,
        market_store: Arc<dyn MarketStore>,
        snapshot_store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            adapters,
            cache,
            market_store,
            snapshot_store,
            stats: Arc::new(IngestionStats::default()),
            last_applied: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn stats(&self) -> Arc<IngestionStats> {
        self.stats.clone()
    }

    /// Fetch every active market on every enabled venue, upsert each into
    /// the store, and record the sync time.
    pub async fn full_sync(&self) -> Result<()> {
        info!("starting full market sync");
        for (venue, adapter) in self.adapters.iter() {
            match adapter.fetch_active_markets().await {
                Ok((markets, latency_ms)) => {
                    debug!(%venue, count = markets.len(), latency_ms, "fetched markets");
                    for market in &markets {
                        if let Err(error) = self.market_store.upsert(market).await {
                            warn!(%venue, %error, "failed to upsert market");
                            self.stats.errors_count.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    self.stats
                        .markets_ingested
                        .fetch_add(markets.len() as u64, Ordering::Relaxed);
                }
                Err(error) => {
                    warn!(%venue, %error, "full sync failed for venue");
                    self.stats.errors_count.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        *self.stats.last_full_sync_at.write() = Some(Utc::now());
        Ok(())
    }

    /// Targeted refresh: re-fetch order books for `subscribed` markets on
    /// every enabled venue, bypassing any push transport. Used as the
    /// `INGESTION_INTERVAL_MS` loop body alongside the push workers.
    pub async fn targeted_refresh(&self, subscribed: &HashMap<Venue, Vec<String>>) -> Result<()> {
        for (venue, external_ids) in subscribed {
            let Some(adapter) = self.adapters.get(*venue) else {
                continue;
            };
            for external_id in external_ids {
                match adapter.fetch_order_book(external_id).await {
                    Ok((Some(book), _)) => {
                        self.apply_order_book(*venue, external_id.clone(), book).await;
                    }
                    Ok((None, _)) => {}
                    Err(error) => {
                        warn!(%venue, external_id, %error, "targeted refresh failed");
                        self.stats.errors_count.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }
        Ok(())
    }

    /// Start every adapter's push (or polling) worker, returning the shared
    /// receiving end of a bounded, typed event channel.
    pub async fn start_push_workers(
        &self,
        subscribed: &HashMap<Venue, Vec<String>>,
    ) -> Result<mpsc::Receiver<IngestionEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        for (venue, adapter) in self.adapters.iter() {
            let ids = subscribed.get(&venue).cloned().unwrap_or_default();
            if ids.is_empty() {
                continue;
            }
            adapter.start_push(ids, tx.clone()).await?;
        }
        Ok(rx)
    }

    pub async fn stop_push_workers(&self) {
        for (_, adapter) in self.adapters.iter() {
            adapter.stop_push().await;
        }
    }

    /// Drain one batch of events already received from `start_push_workers`'
    /// channel, applying each write-through. Callers own the receive loop so
    /// they can select it alongside a shutdown signal.
    pub async fn apply_event(&self, event: IngestionEvent) {
        match event {
            IngestionEvent::OrderBook { venue, external_id, book } => {
                self.apply_order_book(venue, external_id, book).await;
            }
            IngestionEvent::Quote { venue, external_id, quote } => {
                self.apply_quote(venue, external_id, quote).await;
            }
            IngestionEvent::MarketClosed { venue, external_id } => {
                self.apply_market_closed(venue, external_id).await;
            }
            IngestionEvent::Disconnected { venue, reason } => {
                warn!(%venue, reason, "venue push worker disconnected");
                self.stats.errors_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    async fn apply_order_book(&self, venue: Venue, external_id: String, book: crate::domain::OrderBook) {
        let market_id = MarketId::new(venue, external_id);
        if !self.is_in_order(&market_id, book.timestamp()) {
            debug!(%market_id, "dropping out-of-order orderbook update");
            return;
        }

        let best_bid = book.best_bid().map(|l| l.price());
        let best_ask = book.best_ask().map(|l| l.price());
        let midpoint = book.midpoint();
        let spread = book.spread();

        self.cache.update(book);
        self.stats.orderbooks_updated.fetch_add(1, Ordering::Relaxed);

        if let Err(error) = self.snapshot_store.append(&market_id, best_bid, best_ask).await {
            warn!(%market_id, %error, "failed to append orderbook snapshot");
        }
        let _ = self.snapshot_store.trim(&market_id, SNAPSHOT_TRAIL_LEN).await;

        if let Ok(Some(mut market)) = self.market_store.get(&market_id).await {
            market.apply_quote(
                DenormalizedQuote {
                    best_bid,
                    best_ask,
                    midpoint,
                    spread,
                    liquidity_hint: None,
                },
                Utc::now(),
                0,
            );
            let _ = self.market_store.upsert(&market).await;
        }
    }

    async fn apply_quote(&self, venue: Venue, external_id: String, quote: crate::domain::Quote) {
        let market_id = MarketId::new(venue, external_id);
        if !self.is_in_order(&market_id, quote.timestamp()) {
            return;
        }
        self.stats.quotes_updated.fetch_add(1, Ordering::Relaxed);
        if let Ok(Some(mut market)) = self.market_store.get(&market_id).await {
            market.apply_quote(
                DenormalizedQuote {
                    best_bid: quote.best_bid(),
                    best_ask: quote.best_ask(),
                    midpoint: None,
                    spread: None,
                    liquidity_hint: None,
                },
                Utc::now(),
                0,
            );
            let _ = self.market_store.upsert(&market).await;
        }
    }

    async fn apply_market_closed(&self, venue: Venue, external_id: String) {
        let market_id = MarketId::new(venue, external_id);
        if let Ok(Some(mut market)) = self.market_store.get(&market_id).await {
            market.set_status(crate::domain::MarketStatus::Closed);
            let _ = self.market_store.upsert(&market).await;
        }
    }

    /// `true` when `timestamp` is not older than the last applied update
    /// for this market (the within-stream ordering guarantee).
    fn is_in_order(&self, market_id: &MarketId, timestamp: DateTime<Utc>) -> bool {
        let mut guard = self.last_applied.write();
        match guard.get(market_id) {
            Some(last) if *last > timestamp => false,
            _ => {
                guard.insert(market_id.clone(), timestamp);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderBook, PriceLevel};
    use crate::store::memory::{MemoryMarketStore, MemorySnapshotStore};
    use rust_decimal_macros::dec;

    fn orchestrator() -> IngestionOrchestrator {
        IngestionOrchestrator::new(
            Arc::new(AdapterRegistry::from_config(&crate::config::AppConfig::default())),
            Arc::new(OrderBookCache::new()),
            Arc::new(MemoryMarketStore::new()),
            Arc::new(MemorySnapshotStore::new()),
        )
    }

    fn book(id: MarketId, ts: DateTime<Utc>) -> OrderBook {
        OrderBook::with_levels(
            id,
            vec![PriceLevel::new(dec!(0.40), dec!(100))],
            vec![PriceLevel::new(dec!(0.45), dec!(100))],
            ts,
            20,
        )
    }

    #[tokio::test]
    async fn applies_orderbook_event_to_cache() {
        let orch = orchestrator();
        let id = MarketId::new(Venue::Polymarket, "m1");
        orch.apply_event(IngestionEvent::OrderBook {
            venue: Venue::Polymarket,
            external_id: "m1".into(),
            book: book(id.clone(), Utc::now()),
        })
        .await;
        assert!(orch.cache.get(&id).is_some());
        assert_eq!(orch.stats.orderbooks_updated(), 1);
    }

    #[tokio::test]
    async fn drops_out_of_order_update() {
        let orch = orchestrator();
        let id = MarketId::new(Venue::Polymarket, "m1");
        let now = Utc::now();
        let earlier = now - chrono::Duration::seconds(5);

        orch.apply_event(IngestionEvent::OrderBook {
            venue: Venue::Polymarket,
            external_id: "m1".into(),
            book: book(id.clone(), now),
        })
        .await;
        orch.apply_event(IngestionEvent::OrderBook {
            venue: Venue::Polymarket,
            external_id: "m1".into(),
            book: book(id.clone(), earlier),
        })
        .await;

        assert_eq!(orch.stats.orderbooks_updated(), 1);
    }

    #[tokio::test]
    async fn disconnected_event_increments_error_count() {
        let orch = orchestrator();
        orch.apply_event(IngestionEvent::Disconnected {
            venue: Venue::Kalshi,
            reason: "stream ended".into(),
        })
        .await;
        assert_eq!(orch.stats.errors_count(), 1);
    }
}
