//! Order book levels and the `OrderBook` snapshot type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market::MarketId;

/// A single `(price, size)` level on one side of a book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    price: Decimal,
    size: Decimal,
}

impl PriceLevel {
    #[must_use]
    pub const fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.size
    }

    fn is_valid(&self) -> bool {
        self.price >= Decimal::ZERO && self.price <= Decimal::ONE && self.size >= Decimal::ZERO
    }
}

/// A normalized order book snapshot for one `(venue, external_id)` at a
/// moment in time. Construction validates and re-sorts levels per the
/// ingress invariants: no crossed book, strictly monotone levels, no
/// negative size or out-of-range price.
#[derive(Debug, Clone)]
pub struct OrderBook {
    market_id: MarketId,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    timestamp: DateTime<Utc>,
    latency_ms: u64,
    /// Set when the opposite side was reconstructed as `1 - price` rather
    /// than fetched explicitly from the venue.
    synthetic: bool,
    dropped_levels: u32,
}

impl OrderBook {
    /// Build a book from raw levels, sorting, deduplicating crossed/invalid
    /// rows, and counting how many were dropped. `bids` need not be
    /// pre-sorted; `asks` need not be pre-sorted.
    #[must_use]
    pub fn with_levels(
        market_id: MarketId,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
        timestamp: DateTime<Utc>,
        latency_ms: u64,
    ) -> Self {
        let mut dropped = 0u32;

        let mut bids: Vec<PriceLevel> = bids
            .into_iter()
            .filter(|l| {
                let ok = l.is_valid();
                if !ok {
                    dropped += 1;
                }
                ok
            })
            .collect();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        bids.dedup_by_key(|l| l.price);

        let mut asks: Vec<PriceLevel> = asks
            .into_iter()
            .filter(|l| {
                let ok = l.is_valid();
                if !ok {
                    dropped += 1;
                }
                ok
            })
            .collect();
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        asks.dedup_by_key(|l| l.price);

        // Drop a crossed top-of-book: if the best bid would be >= best ask,
        // the feed is inconsistent at this instant; prefer to serve an
        // empty book over a crossed one.
        if let (Some(bid), Some(ask)) = (bids.first(), asks.first()) {
            if bid.price >= ask.price {
                dropped += (bids.len() + asks.len()) as u32;
                bids.clear();
                asks.clear();
            }
        }

        Self {
            market_id,
            bids,
            asks,
            timestamp,
            latency_ms,
            synthetic: false,
            dropped_levels: dropped,
        }
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    #[must_use]
    pub fn midpoint(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some((b.price() + a.price()) / Decimal::TWO),
            _ => None,
        }
    }

    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some(a.price() - b.price()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn mark_synthetic(&mut self) -> &mut Self {
        self.synthetic = true;
        self
    }

    #[must_use]
    pub const fn dropped_levels(&self) -> u32 {
        self.dropped_levels
    }

    /// Age of this snapshot relative to `now`, in milliseconds. Negative
    /// clock skew is clamped to zero.
    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_milliseconds().max(0)
    }

    /// Cumulative size of the top `n` levels on a side.
    #[must_use]
    pub fn depth(levels: &[PriceLevel], n: usize) -> Decimal {
        levels.iter().take(n).map(PriceLevel::size).sum()
    }

    /// `true` when both sides are present and `best_bid < best_ask`, or
    /// when at least one side is empty (vacuously non-crossed).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => b.price() < a.price(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookDto {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub timestamp: DateTime<Utc>,
    pub latency_ms: u64,
    pub synthetic: bool,
}
