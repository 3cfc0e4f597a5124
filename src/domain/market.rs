//! Market identity and the `Market` entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::venue::Venue;

/// Natural key for a market: a venue plus that venue's own identifier for
/// the contract. Used as the cache key, the store primary key, and every
/// `HashMap` key in the core — entities reference each other by this value,
/// never by pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId {
    venue: Venue,
    external_id: String,
}

impl MarketId {
    pub fn new(venue: Venue, external_id: impl Into<String>) -> Self {
        Self {
            venue,
            external_id: external_id.into(),
        }
    }

    #[must_use]
    pub const fn venue(&self) -> Venue {
        self.venue
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.venue.tag(), self.external_id)
    }
}

/// Lifecycle state of a market, per the ingestion contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStatus {
    Active,
    Closed,
    Resolved,
    Cancelled,
}

/// The denormalized top-of-book fields carried on the `Market` row so
/// readers don't need a cache hit for a cheap summary view.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DenormalizedQuote {
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub midpoint: Option<Decimal>,
    pub spread: Option<Decimal>,
    pub liquidity_hint: Option<Decimal>,
}

/// A tradeable binary (YES/NO) prediction market on one venue.
#[derive(Debug, Clone)]
pub struct Market {
    market_id: MarketId,
    question: String,
    description: Option<String>,
    category: Option<String>,
    outcomes: Vec<String>,
    end_date: Option<DateTime<Utc>>,
    resolution_source: Option<String>,
    resolution_rules: Option<String>,
    tick_size: Decimal,
    min_order_size: Decimal,
    fee_rate: Decimal,
    source_url: Option<String>,
    status: MarketStatus,
    quote: DenormalizedQuote,
    last_fetched_at: Option<DateTime<Utc>>,
    fetch_latency_ms: Option<u64>,
}

impl Market {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market_id: MarketId,
        question: impl Into<String>,
        outcomes: Vec<String>,
        tick_size: Decimal,
        min_order_size: Decimal,
        fee_rate: Decimal,
    ) -> Self {
        Self {
            market_id,
            question: question.into(),
            description: None,
            category: None,
            outcomes,
            end_date: None,
            resolution_source: None,
            resolution_rules: None,
            tick_size,
            min_order_size,
            fee_rate,
            source_url: None,
            status: MarketStatus::Active,
            quote: DenormalizedQuote::default(),
            last_fetched_at: None,
            fetch_latency_ms: None,
        }
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.outcomes.len() == 2
    }

    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    #[must_use]
    pub fn resolution_source(&self) -> Option<&str> {
        self.resolution_source.as_deref()
    }

    #[must_use]
    pub fn resolution_rules(&self) -> Option<&str> {
        self.resolution_rules.as_deref()
    }

    #[must_use]
    pub const fn tick_size(&self) -> Decimal {
        self.tick_size
    }

    #[must_use]
    pub const fn min_order_size(&self) -> Decimal {
        self.min_order_size
    }

    #[must_use]
    pub const fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    #[must_use]
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    #[must_use]
    pub const fn status(&self) -> MarketStatus {
        self.status
    }

    #[must_use]
    pub const fn quote(&self) -> &DenormalizedQuote {
        &self.quote
    }

    #[must_use]
    pub const fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.last_fetched_at
    }

    #[must_use]
    pub const fn fetch_latency_ms(&self) -> Option<u64> {
        self.fetch_latency_ms
    }

    /// Days until `end_date`, floor 1, used by ROI annualization. `None`
    /// when the market carries no end date.
    #[must_use]
    pub fn days_to_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.end_date
            .map(|end| (end - now).num_days().max(1))
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_category(&mut self, category: impl Into<String>) -> &mut Self {
        self.category = Some(category.into());
        self
    }

    pub fn set_end_date(&mut self, end_date: DateTime<Utc>) -> &mut Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn set_resolution_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.resolution_source = Some(source.into());
        self
    }

    pub fn set_resolution_rules(&mut self, rules: impl Into<String>) -> &mut Self {
        self.resolution_rules = Some(rules.into());
        self
    }

    pub fn set_source_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn set_status(&mut self, status: MarketStatus) -> &mut Self {
        self.status = status;
        self
    }

    /// Apply a freshly-fetched quote/orderbook summary, per §4.D's
    /// "upsert the denormalized quote fields" responsibility.
    pub fn apply_quote(
        &mut self,
        quote: DenormalizedQuote,
        fetched_at: DateTime<Utc>,
        latency_ms: u64,
    ) -> &mut Self {
        self.quote = quote;
        self.last_fetched_at = Some(fetched_at);
        self.fetch_latency_ms = Some(latency_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Market {
        Market::new(
            MarketId::new(Venue::Polymarket, "0xabc"),
            "Will it rain tomorrow?",
            vec!["Yes".into(), "No".into()],
            dec!(0.01),
            dec!(1),
            dec!(0),
        )
    }

    #[test]
    fn market_id_display_includes_venue_tag() {
        let id = MarketId::new(Venue::Kalshi, "RAIN-24");
        assert_eq!(id.to_string(), "kalshi:RAIN-24");
    }

    #[test]
    fn new_market_is_active_and_binary() {
        let market = sample();
        assert_eq!(market.status(), MarketStatus::Active);
        assert!(market.is_binary());
    }

    #[test]
    fn days_to_expiry_floors_at_one() {
        let mut market = sample();
        let now = Utc::now();
        market.set_end_date(now + chrono::Duration::hours(1));
        assert_eq!(market.days_to_expiry(now), Some(1));
    }

    #[test]
    fn days_to_expiry_none_without_end_date() {
        let market = sample();
        assert_eq!(market.days_to_expiry(Utc::now()), None);
    }

    #[test]
    fn apply_quote_updates_denormalized_fields_and_timestamp() {
        let mut market = sample();
        let now = Utc::now();
        market.apply_quote(
            DenormalizedQuote {
                best_bid: Some(dec!(0.40)),
                best_ask: Some(dec!(0.45)),
                midpoint: Some(dec!(0.425)),
                spread: Some(dec!(0.05)),
                liquidity_hint: Some(dec!(500)),
            },
            now,
            120,
        );
        assert_eq!(market.quote().best_bid, Some(dec!(0.40)));
        assert_eq!(market.last_fetched_at(), Some(now));
        assert_eq!(market.fetch_latency_ms(), Some(120));
    }
}
