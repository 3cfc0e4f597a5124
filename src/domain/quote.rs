//! Lightweight top-of-book snapshot, cheaper than a full `OrderBook` fetch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market::MarketId;

/// Top-of-book plus last trade/volume, used when a venue's summary endpoint
/// is cheaper than its depth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    market_id: MarketId,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
    last_price: Option<Decimal>,
    volume_24h: Option<Decimal>,
    timestamp: DateTime<Utc>,
}

impl Quote {
    #[must_use]
    pub const fn new(
        market_id: MarketId,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
        last_price: Option<Decimal>,
        volume_24h: Option<Decimal>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            market_id,
            best_bid,
            best_ask,
            last_price,
            volume_24h,
            timestamp,
        }
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn best_bid(&self) -> Option<Decimal> {
        self.best_bid
    }

    #[must_use]
    pub const fn best_ask(&self) -> Option<Decimal> {
        self.best_ask
    }

    #[must_use]
    pub const fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    #[must_use]
    pub const fn volume_24h(&self) -> Option<Decimal> {
        self.volume_24h
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_milliseconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::venue::Venue;
    use rust_decimal_macros::dec;

    #[test]
    fn age_ms_is_non_negative() {
        let q = Quote::new(
            MarketId::new(Venue::Kalshi, "x"),
            Some(dec!(0.4)),
            Some(dec!(0.5)),
            None,
            None,
            Utc::now() - chrono::Duration::seconds(2),
        );
        assert!(q.age_ms(Utc::now()) >= 1900);
    }
}
