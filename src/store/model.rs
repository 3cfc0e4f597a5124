//! Diesel row types, one per persisted entity (§6's four write paths).

use diesel::prelude::*;

use super::schema::{arbitrage_opportunities, market_matches, markets, order_book_snapshots};

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub venue: String,
    pub external_id: String,
    pub question: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub outcomes_json: String,
    pub end_date: Option<String>,
    pub resolution_source: Option<String>,
    pub resolution_rules: Option<String>,
    pub tick_size: String,
    pub min_order_size: String,
    pub fee_rate: String,
    pub source_url: Option<String>,
    pub status: String,
    pub best_bid: Option<String>,
    pub best_ask: Option<String>,
    pub last_fetched_at: Option<String>,
    pub fetch_latency_ms: Option<i64>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = order_book_snapshots)]
pub struct NewOrderBookSnapshotRow {
    pub venue: String,
    pub external_id: String,
    pub best_bid: Option<String>,
    pub best_ask: Option<String>,
    pub mid: Option<String>,
    pub captured_at: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = order_book_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderBookSnapshotRow {
    pub id: Option<i32>,
    pub venue: String,
    pub external_id: String,
    pub best_bid: Option<String>,
    pub best_ask: Option<String>,
    pub mid: Option<String>,
    pub captured_at: String,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = market_matches)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketMatchRow {
    pub id: String,
    pub source_venue: String,
    pub source_external_id: String,
    pub target_venue: String,
    pub target_external_id: String,
    pub semantic_score: f64,
    pub date_score: f64,
    pub category_score: f64,
    pub resolution_score: f64,
    pub overall_score: f64,
    pub match_reason: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = arbitrage_opportunities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ArbitrageOpportunityRow {
    pub id: String,
    pub source_venue: String,
    pub source_external_id: String,
    pub target_venue: String,
    pub target_external_id: String,
    pub action: String,
    pub buy_venue: String,
    pub buy_price: String,
    pub sell_venue: String,
    pub sell_price: String,
    pub size: String,
    pub gross_spread: String,
    pub total_fees: String,
    pub estimated_slippage: String,
    pub net_profit: String,
    pub roi: String,
    pub annualized_roi: String,
    pub max_executable_size: String,
    pub confidence: f64,
    pub status: String,
    pub detected_at: String,
    pub source_data_age_ms: i64,
    pub target_data_age_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_row_is_insertable() {
        let _row = MarketRow {
            venue: "polymarket".into(),
            external_id: "0xabc".into(),
            question: "Will it rain?".into(),
            description: None,
            category: None,
            outcomes_json: "[\"Yes\",\"No\"]".into(),
            end_date: None,
            resolution_source: None,
            resolution_rules: None,
            tick_size: "0.01".into(),
            min_order_size: "1".into(),
            fee_rate: "0".into(),
            source_url: None,
            status: "ACTIVE".into(),
            best_bid: None,
            best_ask: None,
            last_fetched_at: None,
            fetch_latency_ms: None,
        };
    }

    #[test]
    fn market_match_row_is_insertable() {
        let _row = MarketMatchRow {
            id: "polymarket:a::kalshi:b".into(),
            source_venue: "polymarket".into(),
            source_external_id: "a".into(),
            target_venue: "kalshi".into(),
            target_external_id: "b".into(),
            semantic_score: 0.9,
            date_score: 1.0,
            category_score: 1.0,
            resolution_score: 0.8,
            overall_score: 0.9,
            match_reason: "reason".into(),
            status: "PENDING_REVIEW".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };
    }
}
