//! Persistence layer: the four write paths named in §6 (Market upsert,
//! OrderBook snapshot append, MarketMatch upsert, ArbitrageOpportunity
//! insert), behind traits with a Diesel/SQLite implementation and an
//! in-memory one for tests.

pub mod memory;
pub mod model;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};

use crate::domain::{ArbitrageOpportunity, Market, MarketId, MarketMatch};
use crate::error::Result;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Build a pooled SQLite connection, `":memory:"` for an ephemeral store.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Ok(Pool::builder().max_size(5).build(manager)?)
}

/// Market upsert keyed by `(venue, external_id)`.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn upsert(&self, market: &Market) -> Result<()>;
    async fn get(&self, id: &MarketId) -> Result<Option<Market>>;
    async fn list_active(&self) -> Result<Vec<Market>>;
}

/// Rolling order-book snapshot trail, trimmed to the last N per market.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn append(&self, market_id: &MarketId, best_bid: Option<rust_decimal::Decimal>, best_ask: Option<rust_decimal::Decimal>) -> Result<()>;
    async fn trim(&self, market_id: &MarketId, keep: usize) -> Result<usize>;
}

/// Cross-venue match upsert; status transitions from the core are limited
/// to promotion to `Stale`.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn upsert(&self, m: &MarketMatch) -> Result<()>;
    async fn get(&self, source: &MarketId, target: &MarketId) -> Result<Option<MarketMatch>>;
    async fn list_confirmed(&self) -> Result<Vec<MarketMatch>>;
    async fn list_pending(&self) -> Result<Vec<MarketMatch>>;
}

/// Append-only opportunity insert.
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn insert(&self, opportunity: &ArbitrageOpportunity) -> Result<()>;
    async fn list_active(&self) -> Result<Vec<ArbitrageOpportunity>>;
}

/// Composite key naming used for `market_matches.id` and log correlation:
/// `"<source_market>::<target_market>"`.
#[must_use]
pub fn match_row_id(source: &MarketId, target: &MarketId) -> String {
    format!("{source}::{target}")
}
