//! Kalshi wire types. Prices are cents (0-100). The order book endpoint
//! returns resting bids on both sides; a YES ask is derived from the NO
//! bid at the same size (`100 - no_bid_price`), so the client builds a
//! complete YES book directly from one response. Kalshi exposes no
//! equivalent endpoint for the NO book, so that side is reconstructed by
//! the adapter's default [`super::super::traits::VenueAdapter::fetch_no_order_book`],
//! which complements the YES book (see
//! [`super::super::normalize::complement_book`]).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MarketsResponse {
    pub markets: Vec<WireMarket>,
}

#[derive(Debug, Deserialize)]
pub struct WireMarket {
    pub ticker: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub category: Option<String>,
    pub close_time: Option<String>,
    pub status: String,
    #[serde(default)]
    pub tick_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OrderBookResponse {
    pub orderbook: OrderBookLevels,
}

#[derive(Debug, Deserialize)]
pub struct OrderBookLevels {
    /// `[price_cents, size]` resting bids on the YES side.
    #[serde(default)]
    pub yes: Vec<[i64; 2]>,
    /// `[price_cents, size]` resting bids on the NO side; a YES ask is
    /// `100 - no_bid_price` at the same size, the standard Kalshi
    /// complement-book convention.
    #[serde(default)]
    pub no: Vec<[i64; 2]>,
}
