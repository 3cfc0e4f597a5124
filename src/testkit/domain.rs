//! Builders for domain primitives used across tests.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{Market, MarketId, OrderBook, PriceLevel, Venue};

/// A one-cent-tick market with a given venue/id/question, default fee and
/// min order size of zero and one respectively.
#[must_use]
pub fn market(venue: Venue, external_id: &str, question: &str) -> Market {
    Market::new(
        MarketId::new(venue, external_id),
        question,
        vec!["Yes".into(), "No".into()],
        Decimal::new(1, 2),
        Decimal::ONE,
        Decimal::ZERO,
    )
}

/// A single-level order book with the given top-of-book bid/ask and equal
/// size on both sides, timestamped now.
#[must_use]
pub fn order_book(market_id: MarketId, bid: Decimal, ask: Decimal, size: Decimal) -> OrderBook {
    OrderBook::with_levels(
        market_id,
        vec![PriceLevel::new(bid, size)],
        vec![PriceLevel::new(ask, size)],
        Utc::now(),
        50,
    )
}

/// A deep book with `levels` price steps of `step` width on each side,
/// `size` at every level, useful for depth/fill-simulation tests.
#[must_use]
pub fn deep_order_book(
    market_id: MarketId,
    best_bid: Decimal,
    best_ask: Decimal,
    step: Decimal,
    size: Decimal,
    levels: usize,
) -> OrderBook {
    let bids = (0..levels)
        .map(|i| PriceLevel::new(best_bid - step * Decimal::from(i as u64), size))
        .collect();
    let asks = (0..levels)
        .map(|i| PriceLevel::new(best_ask + step * Decimal::from(i as u64), size))
        .collect();
    OrderBook::with_levels(market_id, bids, asks, Utc::now(), 50)
}

/// Default tick/min-size pair used by most fixture markets: `$0.01` tick,
/// `1` share minimum.
#[must_use]
pub fn default_tick() -> Decimal {
    dec!(0.01)
}
