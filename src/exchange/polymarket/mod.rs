//! Polymarket CLOB venue adapter: REST client + WebSocket push worker.

pub mod client;
pub mod registry;
pub mod types;
pub mod websocket;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::domain::{Market, MarketId, OrderBook, Quote, Venue};
use crate::error::Result;
use crate::ingestion::events::IngestionEvent;

use super::traits::{VenueAdapter, VenueHealth};
use client::RestClient;
use registry::TokenRegistry;

const DEFAULT_REST_URL: &str = "https://clob.polymarket.com";
const DEFAULT_WS_URL: &str = "wss://ws-subscriptions-clob.polymarket.com/ws/market";

pub struct PolymarketAdapter {
    rest: RestClient,
    ws_url: String,
    tokens: TokenRegistry,
    health: Mutex<VenueHealth>,
    push_stop: Arc<Notify>,
    push_handle: Mutex<Option<JoinHandle<()>>>,
}

impl PolymarketAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rest: RestClient::new(DEFAULT_REST_URL),
            ws_url: DEFAULT_WS_URL.to_string(),
            tokens: TokenRegistry::new(),
            health: Mutex::new(VenueHealth::new()),
            push_stop: Arc::new(Notify::new()),
            push_handle: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_urls(rest_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            rest: RestClient::new(rest_url),
            ws_url: ws_url.into(),
            tokens: TokenRegistry::new(),
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

impl Default for PolymarketAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueAdapter for PolymarketAdapter {
    fn venue(&self) -> Venue {
        Venue::Polymarket
    }

    async fn fetch_active_markets(&self) -> Result<(Vec<Market>, u64)> {
        let result = self.rest.fetch_active_markets().await;
        match &result {
            Ok((triples, latency_ms)) => {
                for (market, yes, no) in triples {
                    self.tokens
                        .insert(market.market_id().external_id().to_string(), yes.clone(), no.clone());
                }
                self.health.lock().record_success(*latency_ms);
            }
            Err(_) => self.health.lock().record_failure(),
        }
        result.map(|(triples, latency_ms)| {
            (triples.into_iter().map(|(m, _, _)| m).collect(), latency_ms)
        })
    }

    async fn fetch_order_book(&self, external_id: &str) -> Result<(Option<OrderBook>, u64)> {
        let Some(tokens) = self.tokens.get(external_id) else {
            warn!(external_id, "no token mapping for market; fetch active markets first");
            return Ok((None, 0));
        };
        let market_id = MarketId::new(Venue::Polymarket, external_id.to_string());
        let result = self.rest.fetch_order_book(&market_id, &tokens.yes).await;
        self.record_result(&result);
        result
    }

    async fn fetch_quote(&self, external_id: &str) -> Result<(Option<Quote>, u64)> {
        let Some(tokens) = self.tokens.get(external_id) else {
            return Ok((None, 0));
        };
        let market_id = MarketId::new(Venue::Polymarket, external_id.to_string());
        let result = self.rest.fetch_quote(&market_id, &tokens.yes).await;
        self.record_result(&result);
        result
    }

    /// Polymarket publishes an explicit NO token; fetch it directly rather
    /// than falling back to the `1 - yes_price` complement.
    async fn fetch_no_order_book(&self, external_id: &str) -> Result<(Option<OrderBook>, u64)> {
        let Some(tokens) = self.tokens.get(external_id) else {
            return Ok((None, 0));
        };
        let market_id = MarketId::new(Venue::Polymarket, external_id.to_string());
        let result = self.rest.fetch_order_book(&market_id, &tokens.no).await;
        self.record_result(&result);
        result
    }

    async fn start_push(
        &self,
        subscribed_ids: Vec<String>,
        sink: mpsc::Sender<IngestionEvent>,
    ) -> Result<()> {
        let mut token_to_market = HashMap::new();
        for external_id in subscribed_ids {
            if let Some(tokens) = self.tokens.get(&external_id) {
                let market_id = MarketId::new(Venue::Polymarket, external_id);
                token_to_market.insert(tokens.yes, market_id);
            }
        }

        let url = self.ws_url.clone();
        let stop = self.push_stop.clone();
        let handle = tokio::spawn(async move {
            if let Err(error) = websocket::run(&url, token_to_market, sink, stop).await {
                warn!(%error, "polymarket push worker exited with error");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_adapter_starts_healthy() {
        let adapter = PolymarketAdapter::new();
        assert_eq!(adapter.venue(), Venue::Polymarket);
        assert_eq!(
            adapter.health().status(),
            super::super::traits::HealthStatus::Healthy
        );
    }
}
