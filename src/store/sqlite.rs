//! Diesel/SQLite implementations of the four store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::{
    Action, ArbitrageOpportunity, Confidence, ExecutionPlan, Market, MarketId, MarketMatch,
    MarketStatus, MatchScores, MatchStatus, OpportunityStatus, ProfitAnalysis, Strategy, Venue,
};
use crate::error::{Error, Result};

use super::model::{
    ArbitrageOpportunityRow, MarketMatchRow, MarketRow, NewOrderBookSnapshotRow,
};
use super::schema::{arbitrage_opportunities, market_matches, markets, order_book_snapshots};
use super::{match_row_id, DbPool, MarketStore, MatchStore, OpportunityStore, SnapshotStore};

pub struct SqliteMarketStore {
    pool: DbPool,
}

impl SqliteMarketStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(market: &Market) -> MarketRow {
        MarketRow {
            venue: market.market_id().venue().tag().to_string(),
            external_id: market.market_id().external_id().to_string(),
            question: market.question().to_string(),
            description: market.description().map(str::to_string),
            category: market.category().map(str::to_string),
            outcomes_json: serde_json::to_string(market.outcomes()).unwrap_or_default(),
            end_date: market.end_date().map(|d| d.to_rfc3339()),
            resolution_source: market.resolution_source().map(str::to_string),
            resolution_rules: market.resolution_rules().map(str::to_string),
            tick_size: market.tick_size().to_string(),
            min_order_size: market.min_order_size().to_string(),
            fee_rate: market.fee_rate().to_string(),
            source_url: market.source_url().map(str::to_string),
            status: status_to_str(market.status()).to_string(),
            best_bid: market.quote().best_bid.map(|d| d.to_string()),
            best_ask: market.quote().best_ask.map(|d| d.to_string()),
            last_fetched_at: market.last_fetched_at().map(|d| d.to_rfc3339()),
            fetch_latency_ms: market.fetch_latency_ms().map(|v| v as i64),
        }
    }

    fn from_row(row: MarketRow) -> Result<Market> {
        let venue = Venue::from_str(&row.venue)?;
        let outcomes: Vec<String> =
            serde_json::from_str(&row.outcomes_json).map_err(|e| Error::Other(e.to_string()))?;
        let mut market = Market::new(
            MarketId::new(venue, row.external_id),
            row.question,
            outcomes,
            row.tick_size.parse().unwrap_or_default(),
            row.min_order_size.parse().unwrap_or_default(),
            row.fee_rate.parse().unwrap_or_default(),
        );
        if let Some(d) = row.description {
            market.set_description(d);
        }
        if let Some(c) = row.category {
            market.set_category(c);
        }
        if let Some(end_date) = row.end_date.as_deref().and_then(parse_rfc3339) {
            market.set_end_date(end_date);
        }
        if let Some(s) = row.resolution_source {
            market.set_resolution_source(s);
        }
        if let Some(r) = row.resolution_rules {
            market.set_resolution_rules(r);
        }
        if let Some(u) = row.source_url {
            market.set_source_url(u);
        }
        market.set_status(status_from_str(&row.status));
        Ok(market)
    }
}

#[async_trait]
impl MarketStore for SqliteMarketStore {
    async fn upsert(&self, market: &Market) -> Result<()> {
        let row = Self::to_row(market);
        let mut conn = self.pool.get()?;
        diesel::replace_into(markets::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn get(&self, id: &MarketId) -> Result<Option<Market>> {
        let mut conn = self.pool.get()?;
        let row: Option<MarketRow> = markets::table
            .filter(markets::venue.eq(id.venue().tag()))
            .filter(markets::external_id.eq(id.external_id()))
            .first(&mut conn)
            .optional()?;
        row.map(Self::from_row).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Market>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<MarketRow> = markets::table
            .filter(markets::status.eq("ACTIVE"))
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }
}

pub struct SqliteSnapshotStore {
    pool: DbPool,
}

impl SqliteSnapshotStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn append(
        &self,
        market_id: &MarketId,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
    ) -> Result<()> {
        let mid = match (best_bid, best_ask) {
            (Some(b), Some(a)) => Some(((b + a) / Decimal::TWO).to_string()),
            _ => None,
        };
        let row = NewOrderBookSnapshotRow {
            venue: market_id.venue().tag().to_string(),
            external_id: market_id.external_id().to_string(),
            best_bid: best_bid.map(|d| d.to_string()),
            best_ask: best_ask.map(|d| d.to_string()),
            mid,
            captured_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self.pool.get()?;
        diesel::insert_into(order_book_snapshots::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn trim(&self, market_id: &MarketId, keep: usize) -> Result<usize> {
        let mut conn = self.pool.get()?;
        let ids: Vec<i32> = order_book_snapshots::table
            .filter(order_book_snapshots::venue.eq(market_id.venue().tag()))
            .filter(order_book_snapshots::external_id.eq(market_id.external_id()))
            .select(order_book_snapshots::id)
            .order(order_book_snapshots::captured_at.desc())
            .load::<Option<i32>>(&mut conn)?
            .into_iter()
            .flatten()
            .skip(keep)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = diesel::delete(order_book_snapshots::table.filter(order_book_snapshots::id.eq_any(&ids)))
            .execute(&mut conn)?;
        Ok(deleted)
    }
}

pub struct SqliteMatchStore {
    pool: DbPool,
}

impl SqliteMatchStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(m: &MarketMatch) -> MarketMatchRow {
        let scores = m.scores();
        MarketMatchRow {
            id: match_row_id(m.source_market(), m.target_market()),
            source_venue: m.source_market().venue().tag().to_string(),
            source_external_id: m.source_market().external_id().to_string(),
            target_venue: m.target_market().venue().tag().to_string(),
            target_external_id: m.target_market().external_id().to_string(),
            semantic_score: scores.semantic,
            date_score: scores.date,
            category_score: scores.category,
            resolution_score: scores.resolution,
            overall_score: scores.overall,
            match_reason: m.match_reason().to_string(),
            status: match_status_to_str(m.status()).to_string(),
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    fn from_row(row: MarketMatchRow) -> Result<MarketMatch> {
        let source = MarketId::new(Venue::from_str(&row.source_venue)?, row.source_external_id);
        let target = MarketId::new(Venue::from_str(&row.target_venue)?, row.target_external_id);
        let scores = MatchScores::combine(
            row.semantic_score,
            row.date_score,
            row.category_score,
            row.resolution_score,
        );
        let mut m = MarketMatch::new(source, target, scores, vec![], row.match_reason);
        match match_status_from_str(&row.status) {
            MatchStatus::Confirmed => m.confirm(),
            MatchStatus::Rejected => m.reject(),
            MatchStatus::Stale => m.mark_stale(),
            MatchStatus::PendingReview => {}
        }
        Ok(m)
    }
}

#[async_trait]
impl MatchStore for SqliteMatchStore {
    async fn upsert(&self, m: &MarketMatch) -> Result<()> {
        let row = Self::to_row(m);
        let mut conn = self.pool.get()?;
        diesel::replace_into(market_matches::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn get(&self, source: &MarketId, target: &MarketId) -> Result<Option<MarketMatch>> {
        let mut conn = self.pool.get()?;
        let row: Option<MarketMatchRow> = market_matches::table
            .find(match_row_id(source, target))
            .first(&mut conn)
            .optional()?;
        row.map(Self::from_row).transpose()
    }

    async fn list_confirmed(&self) -> Result<Vec<MarketMatch>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<MarketMatchRow> = market_matches::table
            .filter(market_matches::status.eq("CONFIRMED"))
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn list_pending(&self) -> Result<Vec<MarketMatch>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<MarketMatchRow> = market_matches::table
            .filter(market_matches::status.eq("PENDING_REVIEW"))
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }
}

pub struct SqliteOpportunityStore {
    pool: DbPool,
}

impl SqliteOpportunityStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(o: &ArbitrageOpportunity) -> ArbitrageOpportunityRow {
        let strategy = o.strategy();
        let profit = o.profit();
        ArbitrageOpportunityRow {
            id: o.id().to_string(),
            source_venue: o.source_market().venue().tag().to_string(),
            source_external_id: o.source_market().external_id().to_string(),
            target_venue: o.target_market().venue().tag().to_string(),
            target_external_id: o.target_market().external_id().to_string(),
            action: format!("{:?}", strategy.action()),
            buy_venue: strategy.buy_venue().tag().to_string(),
            buy_price: strategy.buy_price().to_string(),
            sell_venue: strategy.sell_venue().tag().to_string(),
            sell_price: strategy.sell_price().to_string(),
            size: strategy.size().to_string(),
            gross_spread: profit.gross_spread().to_string(),
            total_fees: profit.total_fees().to_string(),
            estimated_slippage: profit.estimated_slippage().to_string(),
            net_profit: profit.net_profit().to_string(),
            roi: profit.roi().to_string(),
            annualized_roi: profit.annualized_roi().to_string(),
            max_executable_size: profit.max_executable_size().to_string(),
            confidence: o.confidence().overall(),
            status: format!("{:?}", o.status()).to_uppercase(),
            detected_at: o.detected_at().to_rfc3339(),
            source_data_age_ms: o.source_data_age_ms(),
            target_data_age_ms: o.target_data_age_ms(),
        }
    }

    fn from_row(row: ArbitrageOpportunityRow) -> Result<ArbitrageOpportunity> {
        let id = uuid::Uuid::parse_str(&row.id).map_err(|e| Error::Other(e.to_string()))?;
        let source = MarketId::new(Venue::from_str(&row.source_venue)?, row.source_external_id);
        let target = MarketId::new(Venue::from_str(&row.target_venue)?, row.target_external_id);
        let action = action_from_str(&row.action);
        let strategy = Strategy::new(
            action,
            Venue::from_str(&row.buy_venue)?,
            row.buy_price.parse().unwrap_or_default(),
            Venue::from_str(&row.sell_venue)?,
            row.sell_price.parse().unwrap_or_default(),
            row.size.parse().unwrap_or_default(),
        );
        let profit = ProfitAnalysis::new(
            row.gross_spread.parse().unwrap_or_default(),
            row.total_fees.parse().unwrap_or_default(),
            row.estimated_slippage.parse().unwrap_or_default(),
            row.net_profit.parse().unwrap_or_default(),
            row.roi.parse().unwrap_or_default(),
            row.annualized_roi.parse().unwrap_or_default(),
            row.max_executable_size.parse().unwrap_or_default(),
        );
        let confidence = Confidence::new(0.0, 0.0, 0.0, row.source_data_age_ms.max(row.target_data_age_ms));
        let detected_at = parse_rfc3339(&row.detected_at).unwrap_or_else(Utc::now);
        let mut opportunity = ArbitrageOpportunity::new(
            id,
            source,
            target,
            strategy,
            profit,
            confidence,
            ExecutionPlan::new(vec![]),
            detected_at,
            row.source_data_age_ms,
            row.target_data_age_ms,
        );
        match row.status.as_str() {
            "EXPIRED" => opportunity.expire(),
            "EXECUTED" => opportunity.mark_executed(),
            "MISSED" => opportunity.mark_missed(),
            _ => {}
        }
        Ok(opportunity)
    }
}

#[async_trait]
impl OpportunityStore for SqliteOpportunityStore {
    async fn insert(&self, opportunity: &ArbitrageOpportunity) -> Result<()> {
        let row = Self::to_row(opportunity);
        let mut conn = self.pool.get()?;
        diesel::insert_into(arbitrage_opportunities::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<ArbitrageOpportunity>> {
        let mut conn = self.pool.get()?;
        let rows: Vec<ArbitrageOpportunityRow> = arbitrage_opportunities::table
            .filter(arbitrage_opportunities::status.eq("ACTIVE"))
            .load(&mut conn)?;
        rows.into_iter().map(Self::from_row).collect()
    }
}

fn status_to_str(status: MarketStatus) -> &'static str {
    match status {
        MarketStatus::Active => "ACTIVE",
        MarketStatus::Closed => "CLOSED",
        MarketStatus::Resolved => "RESOLVED",
        MarketStatus::Cancelled => "CANCELLED",
    }
}

fn status_from_str(s: &str) -> MarketStatus {
    match s {
        "CLOSED" => MarketStatus::Closed,
        "RESOLVED" => MarketStatus::Resolved,
        "CANCELLED" => MarketStatus::Cancelled,
        _ => MarketStatus::Active,
    }
}

fn match_status_to_str(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::PendingReview => "PENDING_REVIEW",
        MatchStatus::Confirmed => "CONFIRMED",
        MatchStatus::Rejected => "REJECTED",
        MatchStatus::Stale => "STALE",
    }
}

fn match_status_from_str(s: &str) -> MatchStatus {
    match s {
        "CONFIRMED" => MatchStatus::Confirmed,
        "REJECTED" => MatchStatus::Rejected,
        "STALE" => MatchStatus::Stale,
        _ => MatchStatus::PendingReview,
    }
}

fn action_from_str(s: &str) -> Action {
    match s {
        "BuyNoSellNo" => Action::BuyNoSellNo,
        "BuyYesSellNo" => Action::BuyYesSellNo,
        "BuyNoSellYes" => Action::BuyNoSellYes,
        _ => Action::BuyYesSellYes,
    }
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).map(|d| d.with_timezone(&Utc)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel_migrations::MigrationHarness;
    use rust_decimal_macros::dec;

    fn setup() -> DbPool {
        let pool = super::super::create_pool(":memory:").unwrap();
        let mut conn = pool.get().unwrap();
        conn.run_pending_migrations(super::super::MIGRATIONS).unwrap();
        pool
    }

    fn sample_market() -> Market {
        Market::new(
            MarketId::new(Venue::Polymarket, "0xabc"),
            "Will it rain tomorrow?",
            vec!["Yes".into(), "No".into()],
            dec!(0.01),
            dec!(1),
            dec!(0),
        )
    }

    #[tokio::test]
    async fn market_round_trips() {
        let store = SqliteMarketStore::new(setup());
        let market = sample_market();
        store.upsert(&market).await.unwrap();
        let loaded = store.get(market.market_id()).await.unwrap().unwrap();
        assert_eq!(loaded.question(), "Will it rain tomorrow?");
    }

    #[tokio::test]
    async fn market_upsert_is_idempotent() {
        let store = SqliteMarketStore::new(setup());
        let mut market = sample_market();
        store.upsert(&market).await.unwrap();
        market.set_category("weather");
        store.upsert(&market).await.unwrap();
        let loaded = store.get(market.market_id()).await.unwrap().unwrap();
        assert_eq!(loaded.category(), Some("weather"));
    }

    #[tokio::test]
    async fn snapshot_trim_keeps_latest_n() {
        let pool = setup();
        let store = SqliteSnapshotStore::new(pool);
        let id = MarketId::new(Venue::Polymarket, "0xabc");
        for _ in 0..5 {
            store.append(&id, Some(dec!(0.4)), Some(dec!(0.5))).await.unwrap();
        }
        let deleted = store.trim(&id, 2).await.unwrap();
        assert_eq!(deleted, 3);
    }

    #[tokio::test]
    async fn match_upsert_then_confirm_round_trips() {
        let store = SqliteMatchStore::new(setup());
        let source = MarketId::new(Venue::Polymarket, "a");
        let target = MarketId::new(Venue::Kalshi, "b");
        let mut m = MarketMatch::new(
            source.clone(),
            target.clone(),
            MatchScores::combine(0.9, 0.8, 1.0, 0.7),
            vec![],
            "matched on title",
        );
        m.confirm();
        store.upsert(&m).await.unwrap();
        let loaded = store.get(&source, &target).await.unwrap().unwrap();
        assert!(loaded.is_confirmed());
    }
}
