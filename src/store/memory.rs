//! In-memory store implementations, used by tests and `testkit`.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::{ArbitrageOpportunity, Market, MarketId, MarketMatch, MatchStatus};
use crate::error::Result;

use super::{match_row_id, MarketStore, MatchStore, OpportunityStore, SnapshotStore};

#[derive(Default)]
pub struct MemoryMarketStore {
    inner: RwLock<HashMap<MarketId, Market>>,
}

impl MemoryMarketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryMarketStore {
    async fn upsert(&self, market: &Market) -> Result<()> {
        self.inner
            .write()
            .insert(market.market_id().clone(), market.clone());
        Ok(())
    }

    async fn get(&self, id: &MarketId) -> Result<Option<Market>> {
        Ok(self.inner.read().get(id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Market>> {
        Ok(self
            .inner
            .read()
            .values()
            .filter(|m| m.status() == crate::domain::MarketStatus::Active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    inner: RwLock<HashMap<MarketId, Vec<(Option<Decimal>, Option<Decimal>)>>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn append(
        &self,
        market_id: &MarketId,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
    ) -> Result<()> {
        self.inner
            .write()
            .entry(market_id.clone())
            .or_default()
            .push((best_bid, best_ask));
        Ok(())
    }

    async fn trim(&self, market_id: &MarketId, keep: usize) -> Result<usize> {
        let mut guard = self.inner.write();
        let Some(trail) = guard.get_mut(market_id) else {
            return Ok(0);
        };
        let excess = trail.len().saturating_sub(keep);
        if excess > 0 {
            trail.drain(0..excess);
        }
        Ok(excess)
    }
}

#[derive(Default)]
pub struct MemoryMatchStore {
    inner: RwLock<HashMap<String, MarketMatch>>,
}

impl MemoryMatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn upsert(&self, m: &MarketMatch) -> Result<()> {
        let key = match_row_id(m.source_market(), m.target_market());
        self.inner.write().insert(key, m.clone());
        Ok(())
    }

    async fn get(&self, source: &MarketId, target: &MarketId) -> Result<Option<MarketMatch>> {
        Ok(self.inner.read().get(&match_row_id(source, target)).cloned())
    }

    async fn list_confirmed(&self) -> Result<Vec<MarketMatch>> {
        Ok(self
            .inner
            .read()
            .values()
            .filter(|m| m.status() == MatchStatus::Confirmed)
            .cloned()
            .collect())
    }

    async fn list_pending(&self) -> Result<Vec<MarketMatch>> {
        Ok(self
            .inner
            .read()
            .values()
            .filter(|m| m.status() == MatchStatus::PendingReview)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryOpportunityStore {
    inner: RwLock<Vec<ArbitrageOpportunity>>,
}

impl MemoryOpportunityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpportunityStore for MemoryOpportunityStore {
    async fn insert(&self, opportunity: &ArbitrageOpportunity) -> Result<()> {
        self.inner.write().push(opportunity.clone());
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<ArbitrageOpportunity>> {
        Ok(self
            .inner
            .read()
            .iter()
            .filter(|o| o.status() == crate::domain::OpportunityStatus::Active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchScores, Venue};

    #[tokio::test]
    async fn market_store_round_trips() {
        let store = MemoryMarketStore::new();
        let market = Market::new(
            MarketId::new(Venue::Polymarket, "a"),
            "q",
            vec!["Yes".into(), "No".into()],
            Decimal::new(1, 2),
            Decimal::ONE,
            Decimal::ZERO,
        );
        store.upsert(&market).await.unwrap();
        assert!(store.get(market.market_id()).await.unwrap().is_some());
        assert_eq!(store.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_trim_drops_oldest() {
        let store = MemorySnapshotStore::new();
        let id = MarketId::new(Venue::Polymarket, "a");
        for _ in 0..5 {
            store.append(&id, None, None).await.unwrap();
        }
        let dropped = store.trim(&id, 2).await.unwrap();
        assert_eq!(dropped, 3);
    }

    #[tokio::test]
    async fn match_store_filters_by_status() {
        let store = MemoryMatchStore::new();
        let source = MarketId::new(Venue::Polymarket, "a");
        let target = MarketId::new(Venue::Kalshi, "b");
        let mut m = MarketMatch::new(
            source,
            target,
            MatchScores::combine(0.9, 0.8, 1.0, 0.7),
            vec![],
            "r",
        );
        m.confirm();
        store.upsert(&m).await.unwrap();
        assert_eq!(store.list_confirmed().await.unwrap().len(), 1);
        assert_eq!(store.list_pending().await.unwrap().len(), 0);
    }
}
