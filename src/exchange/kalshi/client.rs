//! Kalshi REST client.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::{Market, MarketId, MarketStatus, OrderBook, PriceLevel, Quote, Venue};
use crate::error::Result;
use crate::exchange::normalize::cents_to_fraction;

use super::types::{MarketsResponse, OrderBookResponse, WireMarket};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

pub struct RestClient {
    http: HttpClient,
    base_url: String,
}

impl RestClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builds with static config");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_active_markets(&self) -> Result<(Vec<Market>, u64)> {
        let url = format!("{}/markets?status=open", self.base_url);
        info!(url = %url, "fetching active markets");

        let started = Instant::now();
        let parsed: MarketsResponse = self.http.get(&url).send().await?.json().await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let markets = parsed.markets.into_iter().map(wire_market_to_domain).collect::<Vec<_>>();
        debug!(count = markets.len(), "fetched markets");
        Ok((markets, latency_ms))
    }

    pub async fn fetch_order_book(&self, market_id: &MarketId) -> Result<(Option<OrderBook>, u64)> {
        let url = format!(
            "{}/markets/{}/orderbook",
            self.base_url,
            market_id.external_id()
        );
        let started = Instant::now();
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok((None, started.elapsed().as_millis() as u64));
        }
        let parsed: OrderBookResponse = response.json().await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let bids: Vec<PriceLevel> = parsed
            .orderbook
            .yes
            .iter()
            .map(|[price, size]| {
                PriceLevel::new(cents_to_fraction(Decimal::from(*price)), Decimal::from(*size))
            })
            .collect();
        let asks: Vec<PriceLevel> = parsed
            .orderbook
            .no
            .iter()
            .map(|[price, size]| {
                let yes_ask = cents_to_fraction(Decimal::from(100 - price));
                PriceLevel::new(yes_ask, Decimal::from(*size))
            })
            .collect();

        let book = OrderBook::with_levels(market_id.clone(), bids, asks, Utc::now(), latency_ms);
        Ok((Some(book), latency_ms))
    }

    pub async fn fetch_quote(&self, market_id: &MarketId) -> Result<(Option<Quote>, u64)> {
        let (book, latency_ms) = self.fetch_order_book(market_id).await?;
        let Some(book) = book else {
            return Ok((None, latency_ms));
        };
        let quote = Quote::new(
            market_id.clone(),
            book.best_bid().map(|l| l.price()),
            book.best_ask().map(|l| l.price()),
            None,
            None,
            book.timestamp(),
        );
        Ok((Some(quote), latency_ms))
    }
}

fn wire_market_to_domain(wire: WireMarket) -> Market {
    let tick_size = wire
        .tick_size
        .map(|t| cents_to_fraction(Decimal::from(t)))
        .unwrap_or(Decimal::new(1, 2));

    let market_id = MarketId::new(Venue::Kalshi, wire.ticker);
    let mut market = Market::new(
        market_id,
        wire.title,
        vec!["Yes".to_string(), "No".to_string()],
        tick_size,
        Decimal::ONE,
        Venue::Kalshi.taker_fee(),
    );
    if let Some(subtitle) = wire.subtitle {
        market.set_description(subtitle);
    }
    if let Some(category) = wire.category {
        market.set_category(category);
    }
    if let Some(close_time) = wire.close_time.as_deref().and_then(parse_close_time) {
        market.set_end_date(close_time);
    }
    if wire.status != "open" {
        market.set_status(MarketStatus::Closed);
    }
    market
}

fn parse_close_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_market_maps_status_to_closed() {
        let wire = WireMarket {
            ticker: "RAIN-24".into(),
            title: "Will it rain?".into(),
            subtitle: None,
            category: None,
            close_time: None,
            status: "closed".into(),
            tick_size: None,
        };
        let market = wire_market_to_domain(wire);
        assert_eq!(market.status(), MarketStatus::Closed);
    }

    #[test]
    fn wire_market_defaults_to_one_cent_tick() {
        let wire = WireMarket {
            ticker: "X".into(),
            title: "t".into(),
            subtitle: None,
            category: None,
            close_time: None,
            status: "open".into(),
            tick_size: None,
        };
        let market = wire_market_to_domain(wire);
        assert_eq!(market.tick_size(), Decimal::new(1, 2));
    }
}
