//! The periodic cross-venue matcher: 60 s loop, 30-day hard prefilter,
//! idempotent upsert by `(source_market, target_market)`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{Market, MarketMatch};
use crate::error::Result;
use crate::store::{MarketStore, MatchStore};

use super::scoring::{self, fails_hard_prefilter};
use super::MATCH_THRESHOLD;

pub struct Matcher {
    markets: Arc<dyn MarketStore>,
    matches: Arc<dyn MatchStore>,
}

impl Matcher {
    #[must_use]
    pub fn new(markets: Arc<dyn MarketStore>, matches: Arc<dyn MatchStore>) -> Self {
        Self { markets, matches }
    }

    /// Score every unordered pair of active markets across distinct venues,
    /// upserting a `MarketMatch` for every pair clearing `MATCH_THRESHOLD`.
    /// Returns the number of pairs upserted. Running this twice over the
    /// same market set is idempotent: the natural key never changes and
    /// `update_scores` never demotes a reviewed match's status.
    pub async fn run_once(&self) -> Result<usize> {
        let active = self.markets.list_active().await?;
        let mut upserted = 0usize;

        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                let a = &active[i];
                let b = &active[j];
                if a.market_id().venue() == b.market_id().venue() {
                    continue;
                }
                if fails_hard_prefilter(a, b) {
                    continue;
                }

                let candidate = scoring::score_pair(a, b);
                if candidate.scores.overall < MATCH_THRESHOLD {
                    continue;
                }

                self.upsert_pair(a, b, candidate).await?;
                upserted += 1;
            }
        }

        info!(upserted, "matcher pass complete");
        Ok(upserted)
    }

    async fn upsert_pair(
        &self,
        a: &Market,
        b: &Market,
        candidate: scoring::Candidate,
    ) -> Result<()> {
        // Canonical (source, target) ordering so the natural key is stable
        // across runs regardless of iteration order.
        let (source, target) = if a.market_id() <= b.market_id() {
            (a.market_id().clone(), b.market_id().clone())
        } else {
            (b.market_id().clone(), a.market_id().clone())
        };

        match self.matches.get(&source, &target).await? {
            Some(mut existing) => {
                existing.update_scores(
                    candidate.scores,
                    candidate.matched_terms,
                    candidate.match_reason,
                );
                if let Some(warning) = candidate.resolution_warning {
                    existing.set_resolution_diff(warning);
                }
                debug!(%source, %target, "updated existing match");
                self.matches.upsert(&existing).await
            }
            None => {
                let mut created = MarketMatch::new(
                    source.clone(),
                    target.clone(),
                    candidate.scores,
                    candidate.matched_terms,
                    candidate.match_reason,
                );
                if let Some(warning) = candidate.resolution_warning {
                    created.set_resolution_diff(warning);
                }
                debug!(%source, %target, "created new match");
                self.matches.upsert(&created).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, Venue};
    use crate::store::memory::{MemoryMarketStore, MemoryMatchStore};
    use rust_decimal::Decimal;

    fn market(venue: Venue, id: &str, question: &str) -> Market {
        Market::new(
            MarketId::new(venue, id),
            question,
            vec!["Yes".into(), "No".into()],
            Decimal::new(1, 2),
            Decimal::ONE,
            Decimal::ZERO,
        )
    }

    #[tokio::test]
    async fn matches_similar_cross_venue_questions() {
        let markets = Arc::new(MemoryMarketStore::new());
        let matches = Arc::new(MemoryMatchStore::new());

        markets
            .upsert(&market(
                Venue::Polymarket,
                "p1",
                "Will Donald Trump win the 2028 presidential election?",
            ))
            .await
            .unwrap();
        markets
            .upsert(&market(
                Venue::Kalshi,
                "k1",
                "Will Trump win the 2028 presidential election?",
            ))
            .await
            .unwrap();

        let matcher = Matcher::new(markets, matches.clone());
        let count = matcher.run_once().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(matches.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn skips_same_venue_pairs() {
        let markets = Arc::new(MemoryMarketStore::new());
        let matches = Arc::new(MemoryMatchStore::new());

        markets
            .upsert(&market(Venue::Polymarket, "p1", "Will X happen?"))
            .await
            .unwrap();
        markets
            .upsert(&market(Venue::Polymarket, "p2", "Will X happen?"))
            .await
            .unwrap();

        let matcher = Matcher::new(markets, matches);
        assert_eq!(matcher.run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn running_twice_does_not_demote_confirmed_status() {
        let markets = Arc::new(MemoryMarketStore::new());
        let matches = Arc::new(MemoryMatchStore::new());

        markets
            .upsert(&market(
                Venue::Polymarket,
                "p1",
                "Will the Fed cut interest rates in March 2026?",
            ))
            .await
            .unwrap();
        markets
            .upsert(&market(
                Venue::Kalshi,
                "k1",
                "Will the Fed cut interest rates in March 2026?",
            ))
            .await
            .unwrap();

        let matcher = Matcher::new(markets.clone(), matches.clone());
        matcher.run_once().await.unwrap();

        let source = MarketId::new(Venue::Kalshi, "k1");
        let target = MarketId::new(Venue::Polymarket, "p1");
        // Natural key orders by MarketId::Ord; fetch whichever order is canonical.
        let existing = matches
            .get(&target, &source)
            .await
            .unwrap()
            .or(matches.get(&source, &target).await.unwrap())
            .expect("match exists");
        assert!(!existing.is_confirmed());

        matcher.run_once().await.unwrap();
        assert_eq!(matches.list_pending().await.unwrap().len(), 1);
    }
}
