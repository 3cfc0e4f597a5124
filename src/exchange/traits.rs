//! The venue adapter contract: one REST + push client per external venue,
//! normalizing that venue's shapes into the common domain types.

use async_trait::async_trait;
use std::collections::VecDeque;

use crate::domain::{Market, OrderBook, Quote};
use crate::error::Result;
use crate::exchange::normalize::complement_book;
use crate::ingestion::events::IngestionEvent;

/// Health state of a single adapter, transitioning per §4.A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Offline,
}

/// Rolling health tracker: last-100 latency window, consecutive error
/// count, and the derived status.
#[derive(Debug, Clone)]
pub struct VenueHealth {
    latencies: VecDeque<u64>,
    consecutive_errors: u32,
    status: HealthStatus,
}

impl VenueHealth {
    const WINDOW: usize = 100;

    #[must_use]
    pub fn new() -> Self {
        Self {
            latencies: VecDeque::with_capacity(Self::WINDOW),
            consecutive_errors: 0,
            status: HealthStatus::Healthy,
        }
    }

    /// Record a successful call: resets `consecutive_errors` and transitions
    /// to `Healthy`.
    pub fn record_success(&mut self, latency_ms: u64) {
        if self.latencies.len() == Self::WINDOW {
            self.latencies.pop_front();
        }
        self.latencies.push_back(latency_ms);
        self.consecutive_errors = 0;
        self.status = HealthStatus::Healthy;
    }

    /// Record a failed call, advancing `consecutive_errors` and recomputing
    /// status: `>= 3` is `Degraded`, `>= 10` is `Offline`.
    pub fn record_failure(&mut self) {
        self.consecutive_errors += 1;
        self.status = if self.consecutive_errors >= 10 {
            HealthStatus::Offline
        } else if self.consecutive_errors >= 3 {
            HealthStatus::Degraded
        } else {
            self.status
        };
    }

    #[must_use]
    pub const fn status(&self) -> HealthStatus {
        self.status
    }

    #[must_use]
    pub const fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    #[must_use]
    pub fn average_latency_ms(&self) -> Option<f64> {
        if self.latencies.is_empty() {
            None
        } else {
            Some(self.latencies.iter().sum::<u64>() as f64 / self.latencies.len() as f64)
        }
    }
}

impl Default for VenueHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform capability set every venue adapter implements (§4.A). Adapters
/// that lack a push transport implement `start_push` as a bounded-polling
/// loop instead of an error.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    /// Venue this adapter serves.
    fn venue(&self) -> crate::domain::Venue;

    /// Full list of currently tradeable markets, and the call latency.
    async fn fetch_active_markets(&self) -> Result<(Vec<Market>, u64)>;

    /// Top-N (N >= 10) levels on both sides for one market, and the call
    /// latency. `Ok(None)` when the venue reports no book for this id.
    async fn fetch_order_book(&self, external_id: &str) -> Result<(Option<OrderBook>, u64)>;

    /// Top-of-book only, cheaper than a full depth fetch.
    async fn fetch_quote(&self, external_id: &str) -> Result<(Option<Quote>, u64)>;

    /// The book for the market's NO side. Venues that publish an explicit
    /// NO token should override this; the default reconstructs it as the
    /// complement of the YES book and marks the result `synthetic`.
    async fn fetch_no_order_book(&self, external_id: &str) -> Result<(Option<OrderBook>, u64)> {
        let (yes_book, latency_ms) = self.fetch_order_book(external_id).await?;
        let Some(yes_book) = yes_book else {
            return Ok((None, latency_ms));
        };
        Ok((Some(complement_book(&yes_book)), latency_ms))
    }

    /// Begin streaming updates for `subscribed_ids` into `sink`. Adapters
    /// without a push transport poll `subscribed_ids` under their own rate
    /// gate instead of returning an error.
    async fn start_push(
        &self,
        subscribed_ids: Vec<String>,
        sink: tokio::sync::mpsc::Sender<IngestionEvent>,
    ) -> Result<()>;

    /// Stop any push/poll worker started by `start_push`.
    async fn stop_push(&self);

    /// Current health snapshot.
    fn health(&self) -> VenueHealth;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_until_three_consecutive_failures() {
        let mut health = VenueHealth::new();
        health.record_failure();
        health.record_failure();
        assert_eq!(health.status(), HealthStatus::Healthy);
        health.record_failure();
        assert_eq!(health.status(), HealthStatus::Degraded);
    }

    #[test]
    fn offline_after_ten_consecutive_failures() {
        let mut health = VenueHealth::new();
        for _ in 0..10 {
            health.record_failure();
        }
        assert_eq!(health.status(), HealthStatus::Offline);
        assert_eq!(health.consecutive_errors(), 10);
    }

    #[test]
    fn success_resets_to_healthy() {
        let mut health = VenueHealth::new();
        for _ in 0..10 {
            health.record_failure();
        }
        health.record_success(50);
        assert_eq!(health.status(), HealthStatus::Healthy);
        assert_eq!(health.consecutive_errors(), 0);
    }

    #[test]
    fn average_latency_tracks_window() {
        let mut health = VenueHealth::new();
        assert_eq!(health.average_latency_ms(), None);
        health.record_success(100);
        health.record_success(200);
        assert_eq!(health.average_latency_ms(), Some(150.0));
    }

    #[test]
    fn latency_window_caps_at_100_entries() {
        let mut health = VenueHealth::new();
        for _ in 0..150 {
            health.record_success(10);
        }
        assert_eq!(health.latencies.len(), 100);
    }
}
