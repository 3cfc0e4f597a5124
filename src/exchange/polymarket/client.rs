//! Polymarket CLOB REST client.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::{Market, MarketId, OrderBook, PriceLevel, Quote, Venue};
use crate::error::{Error, Result, VenueErrorKind};

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

    /// Returns each market alongside its YES/NO token ids, so the caller can
    /// maintain a `market_id -> tokens` registry for book fetches.
    pub async fn fetch_active_markets(&self) -> Result<(Vec<(Market, String, String)>, u64)> {
        let url = format!("{}/markets?active=true&closed=false", self.base_url);
        info!(url = %url, "fetching active markets");

        let started = Instant::now();
        let response = self.http.get(&url).send().await.map_err(|e| {
            Error::Venue {
                venue: Venue::Polymarket.tag().to_string(),
                kind: VenueErrorKind::Transient,
                message: e.to_string(),
            }
        })?;
        let parsed: MarketsResponse = response.json().await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let markets = parsed
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(wire_market_to_domain)
            .collect::<Vec<_>>();
        debug!(count = markets.len(), "fetched markets");
        Ok((markets, latency_ms))
    }

    pub async fn fetch_order_book(
        &self,
        market_id: &MarketId,
        token_id: &str,
    ) -> Result<(Option<OrderBook>, u64)> {
        let url = format!("{}/book?token_id={}", self.base_url, token_id);
        let started = Instant::now();
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok((None, started.elapsed().as_millis() as u64));
        }
        let parsed: OrderBookResponse = response.json().await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let bids = parse_levels(&parsed.bids);
        let asks = parse_levels(&parsed.asks);
        let book = OrderBook::with_levels(market_id.clone(), bids, asks, Utc::now(), latency_ms);
        Ok((Some(book), latency_ms))
    }

    pub async fn fetch_quote(&self, market_id: &MarketId, token_id: &str) -> Result<(Option<Quote>, u64)> {
        let (book, latency_ms) = self.fetch_order_book(market_id, token_id).await?;
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

fn parse_levels(levels: &[super::types::WirePriceLevel]) -> Vec<PriceLevel> {
    levels
        .iter()
        .filter_map(|l| {
            let price: Decimal = l.price.parse().ok()?;
            let size: Decimal = l.size.parse().ok()?;
            Some(PriceLevel::new(price, size))
        })
        .collect()
}

fn wire_market_to_domain(wire: WireMarket) -> Option<(Market, String, String)> {
    if wire.tokens.len() < 2 {
        warn!(condition_id = %wire.condition_id, "skipping market with fewer than 2 outcomes");
        return None;
    }
    let outcomes: Vec<String> = wire.tokens.iter().map(|t| t.outcome.clone()).collect();
    let tick_size: Decimal = wire
        .minimum_tick_size
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Decimal::new(1, 2));
    let min_order_size: Decimal = wire
        .minimum_order_size
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Decimal::ONE);

    let market_id = MarketId::new(Venue::Polymarket, wire.condition_id.clone());
    let mut market = Market::new(
        market_id,
        wire.question.unwrap_or_default(),
        outcomes,
        tick_size,
        min_order_size,
        Venue::Polymarket.taker_fee(),
    );
    if let Some(description) = wire.description {
        market.set_description(description);
    }
    if let Some(category) = wire.category {
        market.set_category(category);
    }
    if let Some(end_date) = wire.end_date_iso.as_deref().and_then(parse_end_date) {
        market.set_end_date(end_date);
    }
    if wire.closed || !wire.active {
        market.set_status(crate::domain::MarketStatus::Closed);
    }

    let yes_token = wire
        .tokens
        .iter()
        .find(|t| t.outcome.eq_ignore_ascii_case("yes"))
        .or_else(|| wire.tokens.first())?
        .token_id
        .clone();
    let no_token = wire
        .tokens
        .iter()
        .find(|t| t.outcome.eq_ignore_ascii_case("no"))
        .or_else(|| wire.tokens.get(1))?
        .token_id
        .clone();

    Some((market, yes_token, no_token))
}

fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_end_date_accepts_rfc3339() {
        let dt = parse_end_date("2024-11-05T00:00:00Z");
        assert!(dt.is_some());
    }

    #[test]
    fn parse_end_date_rejects_garbage() {
        assert!(parse_end_date("not-a-date").is_none());
    }

    #[test]
    fn wire_market_with_one_token_is_skipped() {
        let wire = WireMarket {
            condition_id: "c1".into(),
            question: Some("q".into()),
            description: None,
            category: None,
            end_date_iso: None,
            tokens: vec![super::super::types::WireToken {
                token_id: "t1".into(),
                outcome: "Yes".into(),
            }],
            active: true,
            closed: false,
            minimum_order_size: None,
            minimum_tick_size: None,
        };
        assert!(wire_market_to_domain(wire).is_none());
    }
}
