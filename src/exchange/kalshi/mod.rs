//! Kalshi venue adapter: REST client only, no public push transport, so
//! `start_push` polls `subscribed_ids` under the venue's own rate gate.

pub mod client;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::domain::{Market, MarketId, OrderBook, Quote, Venue};
use crate::error::Result;
use crate::ingestion::events::IngestionEvent;

use super::ratelimit::SharedVenueGate;
use super::traits::{VenueAdapter, VenueHealth};
use client::RestClient;

const DEFAULT_REST_URL: &str = "https://trading-api.kalshi.com/trade-api/v2";
const POLL_INTERVAL: Duration = Duration::from_millis(2000);

pub struct KalshiAdapter {
    rest: RestClient,
    gate: SharedVenueGate,
    health: Mutex<VenueHealth>,
    push_stop: Arc<Notify>,
    push_handle: Mutex<Option<JoinHandle<()>>>,
}

impl KalshiAdapter {
    #[must_use]
    pub fn new(gate: SharedVenueGate) -> Self {
        Self {
            rest: RestClient::new(DEFAULT_REST_URL),
            gate,
            health: Mutex::new(VenueHealth::new()),
            push_stop: Arc::new(Notify::new()),
            push_handle: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_url(base_url: impl Into<String>, gate: SharedVenueGate) -> Self {
        Self {
            rest: RestClient::new(base_url),
            gate,
            health: Mutex::new(VenueHealth::new()),
            push_stop: Arc::new(Notify::new()),
            push_handle: Mutex::new(None),
        }
    }

    fn record_result<T>(&self, result: &Result<(T, u64)>) {
        match result {
            Ok((_, latency_ms)) => self.health.lock().record_success(*latency_ms),
            Err(_) => self.health.lock().record_failure(),
        }
    }
}

#[async_trait]
impl VenueAdapter for KalshiAdapter {
    fn venue(&self) -> Venue {
        Venue::Kalshi
    }

    async fn fetch_active_markets(&self) -> Result<(Vec<Market>, u64)> {
        self.gate.acquire().await;
        let result = self.rest.fetch_active_markets().await;
        self.record_result(&result);
        result
    }

    async fn fetch_order_book(&self, external_id: &str) -> Result<(Option<OrderBook>, u64)> {
        self.gate.acquire().await;
        let market_id = MarketId::new(Venue::Kalshi, external_id.to_string());
        let result = self.rest.fetch_order_book(&market_id).await;
        self.record_result(&result);
        result
    }

    async fn fetch_quote(&self, external_id: &str) -> Result<(Option<Quote>, u64)> {
        self.gate.acquire().await;
        let market_id = MarketId::new(Venue::Kalshi, external_id.to_string());
        let result = self.rest.fetch_quote(&market_id).await;
        self.record_result(&result);
        result
    }

    /// Bounded poll loop: Kalshi's wire order book already carries both
    /// sides (YES asks derived from NO bids at parse time), so there is no
    /// explicit venue push transport to connect to here.
    async fn start_push(
        &self,
        subscribed_ids: Vec<String>,
        sink: mpsc::Sender<IngestionEvent>,
    ) -> Result<()> {
        let stop = self.push_stop.clone();
        let gate = self.gate.clone();
        let rest = RestClient::new(self.rest.base_url().to_string());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            loop {
                tokio::select! {
                    _ = stop.notified() => return,
                    _ = ticker.tick() => {
                        for external_id in &subscribed_ids {
                            gate.acquire().await;
                            let market_id = MarketId::new(Venue::Kalshi, external_id.clone());
                            match rest.fetch_order_book(&market_id).await {
                                Ok((Some(book), _)) => {
                                    let _ = sink.send(IngestionEvent::OrderBook {
                                        venue: Venue::Kalshi,
                                        external_id: external_id.clone(),
                                        book,
                                    }).await;
                                }
                                Ok((None, _)) => {
                                    let _ = sink.send(IngestionEvent::MarketClosed {
                                        venue: Venue::Kalshi,
                                        external_id: external_id.clone(),
                                    }).await;
                                }
                                Err(error) => {
                                    warn!(%error, external_id, "kalshi poll failed");
                                }
                            }
                        }
                    }
                }
            }
        });
        *self.push_handle.lock() = Some(handle);
        Ok(())
    }

    async fn stop_push(&self) {
        self.push_stop.notify_waiters();
        if let Some(handle) = self.push_handle.lock().take() {
            let _ = handle.await;
        }
    }

    fn health(&self) -> VenueHealth {
        self.health.lock().clone()
    }
}
