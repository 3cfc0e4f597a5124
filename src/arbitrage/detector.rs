//! The arbitrage detector: per-confirmed-match fill simulation, profit,
//! and confidence scoring, run once per scan-loop tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::OrderBookCache;
use crate::config::ThresholdsConfig;
use crate::domain::{
    Action, ArbitrageOpportunity, Confidence, ExecutionPlan, ExecutionStep, Market, MarketId,
    OrderBook, PriceLevel, ProfitAnalysis, Strategy, Venue,
};
use crate::error::Result;
use crate::ingestion::events::PushEvent;
use crate::status::PushBus;
use crate::store::{MarketStore, MatchStore, OpportunityStore};

/// Cap on `max_executable_size` regardless of how deep the book runs.
const MAX_SIZE_CAP: Decimal = dec!(10000);
/// Depth-band width around the top-of-book price admitted into the fill
/// simulation, bounding slippage exposure.
const BAND_UP: Decimal = dec!(1.05);
const BAND_DOWN: Decimal = dec!(0.95);
const DEPTH_LEVELS: usize = 5;

struct Candidate {
    strategy: Strategy,
    profit: ProfitAnalysis,
    confidence: Confidence,
    execution_plan: ExecutionPlan,
}

pub struct Detector {
    cache: Arc<OrderBookCache>,
    markets: Arc<dyn MarketStore>,
    matches: Arc<dyn MatchStore>,
    opportunities: Arc<dyn OpportunityStore>,
    push_bus: Arc<dyn PushBus>,
    thresholds: ThresholdsConfig,
}

impl Detector {
    #[must_use]
    pub fn new(
        cache: Arc<OrderBookCache>,
        markets: Arc<dyn MarketStore>,
        matches: Arc<dyn MatchStore>,
        opportunities: Arc<dyn OpportunityStore>,
        push_bus: Arc<dyn PushBus>,
        thresholds: ThresholdsConfig,
    ) -> Self {
        Self {
            cache,
            markets,
            matches,
            opportunities,
            push_bus,
            thresholds,
        }
    }

    /// One detector tick: scan every confirmed match, emit the better of
    /// the two directional candidates where one clears every gate. Returns
    /// the number of opportunities emitted.
    pub async fn scan_once(&self) -> Result<usize> {
        let confirmed = self.matches.list_confirmed().await?;
        let now = Utc::now();
        let stale_ms = self.thresholds.orderbook_stale_threshold_ms as i64;
        let mut emitted = 0usize;

        for market_match in confirmed {
            let source_id = market_match.source_market().clone();
            let target_id = market_match.target_market().clone();

            let (Some(source_book), Some(target_book)) = self.cache.get_pair(&source_id, &target_id)
            else {
                continue;
            };
            if source_book.age_ms(now) >= stale_ms || target_book.age_ms(now) >= stale_ms {
                continue;
            }

            let Some(source_market) = self.markets.get(&source_id).await? else {
                continue;
            };
            let Some(target_market) = self.markets.get(&target_id).await? else {
                continue;
            };

            let match_quality = market_match.scores().overall;

            let forward = self.evaluate_direction(
                &source_book,
                source_id.venue(),
                &source_market,
                &target_book,
                target_id.venue(),
                &target_market,
                match_quality,
                stale_ms,
                now,
            );
            let reverse = self.evaluate_direction(
                &target_book,
                target_id.venue(),
                &target_market,
                &source_book,
                source_id.venue(),
                &source_market,
                match_quality,
                stale_ms,
                now,
            );

            let best = match (forward, reverse) {
                (Some(a), Some(b)) => {
                    if a.profit.net_profit() >= b.profit.net_profit() {
                        Some(a)
                    } else {
                        Some(b)
                    }
                }
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            };

            let Some(candidate) = best else { continue };

            let opportunity = ArbitrageOpportunity::new(
                Uuid::new_v4(),
                source_id.clone(),
                target_id.clone(),
                candidate.strategy,
                candidate.profit,
                candidate.confidence,
                candidate.execution_plan,
                now,
                source_book.age_ms(now),
                target_book.age_ms(now),
            );
            self.opportunities.insert(&opportunity).await?;
            self.push_bus
                .publish(PushEvent::NewOpportunity {
                    id: opportunity.id(),
                    match_source: source_id.to_string(),
                    match_target: target_id.to_string(),
                    roi: opportunity.profit().roi().to_f64().unwrap_or(0.0),
                    net_profit: opportunity.profit().net_profit().to_f64().unwrap_or(0.0),
                    confidence: opportunity.confidence().overall(),
                })
                .await;
            debug!(%source_id, %target_id, "arbitrage opportunity emitted");
            emitted += 1;
        }

        if emitted > 0 {
            info!(emitted, "arbitrage scan complete");
        }
        Ok(emitted)
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_direction(
        &self,
        buy_book: &OrderBook,
        buy_venue: Venue,
        buy_market: &Market,
        sell_book: &OrderBook,
        sell_venue: Venue,
        sell_market: &Market,
        match_quality: f64,
        stale_ms: i64,
        now: DateTime<Utc>,
    ) -> Option<Candidate> {
        let ask = buy_book.best_ask()?;
        let bid = sell_book.best_bid()?;
        let ask_price = ask.price();
        let bid_price = bid.price();
        if ask_price <= Decimal::ZERO {
            return None;
        }

        let gross_spread = bid_price - ask_price;
        if gross_spread <= Decimal::ZERO {
            return None;
        }

        let buy_fee = ask_price * buy_venue.taker_fee();
        let sell_fee = bid_price * sell_venue.taker_fee();
        let net_spread_per_share = gross_spread - buy_fee - sell_fee;
        if net_spread_per_share <= Decimal::ZERO {
            return None;
        }

        let (_, buy_fillable, buy_slippage) =
            simulate_fill(buy_book.asks(), ask_price, |price, top| price <= top * BAND_UP)?;
        let (_, sell_fillable, sell_slippage) =
            simulate_fill(sell_book.bids(), bid_price, |price, top| price >= top * BAND_DOWN)?;

        let max_executable_size = buy_fillable.min(sell_fillable).min(MAX_SIZE_CAP);
        let min_executable = Decimal::from_f64(self.thresholds.min_executable_size_usd)
            .unwrap_or(Decimal::TEN);
        if max_executable_size < min_executable {
            return None;
        }

        let combined_slippage = (buy_slippage + sell_slippage) / Decimal::TWO;
        let net_profit = (net_spread_per_share - combined_slippage) * max_executable_size;
        if net_profit <= Decimal::ZERO {
            return None;
        }

        let roi_denominator = ask_price * max_executable_size * (Decimal::ONE + buy_venue.taker_fee());
        if roi_denominator.is_zero() {
            return None;
        }
        let roi = net_profit / roi_denominator;

        let days_to_expiry = buy_market
            .days_to_expiry(now)
            .or_else(|| sell_market.days_to_expiry(now))
            .unwrap_or(1)
            .max(1);
        let annualized_roi = roi * Decimal::from(365) / Decimal::from(days_to_expiry);

        let buy_age = buy_book.age_ms(now);
        let sell_age = sell_book.age_ms(now);
        let freshness = (1.0 - (buy_age.max(sell_age) as f64 / stale_ms as f64)).max(0.0);

        let depths = [
            OrderBook::depth(buy_book.bids(), DEPTH_LEVELS),
            OrderBook::depth(buy_book.asks(), DEPTH_LEVELS),
            OrderBook::depth(sell_book.bids(), DEPTH_LEVELS),
            OrderBook::depth(sell_book.asks(), DEPTH_LEVELS),
        ];
        let min_depth = depths.into_iter().fold(Decimal::MAX, Decimal::min);
        let liquidity = (min_depth.to_f64().unwrap_or(0.0) / 1000.0).clamp(0.0, 1.0);

        let confidence = Confidence::new(freshness, liquidity, match_quality, buy_age.max(sell_age));
        if confidence.overall() < self.thresholds.min_confidence_score {
            return None;
        }

        let profit = ProfitAnalysis::new(
            gross_spread,
            buy_fee + sell_fee,
            combined_slippage,
            net_profit,
            roi,
            annualized_roi,
            max_executable_size,
        );

        let strategy = Strategy::new(
            Action::BuyYesSellYes,
            buy_venue,
            ask_price,
            sell_venue,
            bid_price,
            max_executable_size,
        );

        let execution_plan = build_execution_plan(
            &strategy,
            buy_fee,
            sell_fee,
            buy_slippage,
            sell_slippage,
            buy_market.source_url(),
            sell_market.source_url(),
        );

        Some(Candidate {
            strategy,
            profit,
            confidence,
            execution_plan,
        })
    }
}

/// Walk `levels` (already sorted by the book's own construction), admitting
/// every level `within_band` of `top`, returning `(avg_fill_price,
/// total_fillable_size, per_share_slippage)`. `None` when nothing qualifies.
fn simulate_fill(
    levels: &[PriceLevel],
    top: Decimal,
    within_band: impl Fn(Decimal, Decimal) -> bool,
) -> Option<(Decimal, Decimal, Decimal)> {
    let mut total_size = Decimal::ZERO;
    let mut weighted = Decimal::ZERO;
    for level in levels {
        if within_band(level.price(), top) {
            total_size += level.size();
            weighted += level.price() * level.size();
        }
    }
    if total_size.is_zero() {
        return None;
    }
    let avg_fill_price = weighted / total_size;
    let slippage = (avg_fill_price - top).abs();
    Some((avg_fill_price, total_size, slippage))
}

fn build_execution_plan(
    strategy: &Strategy,
    buy_fee: Decimal,
    sell_fee: Decimal,
    buy_slippage: Decimal,
    sell_slippage: Decimal,
    buy_url: Option<&str>,
    sell_url: Option<&str>,
) -> ExecutionPlan {
    let size = strategy.size();
    let buy_net_cost = (strategy.buy_price() + buy_fee) * size;
    let sell_net_cost = (strategy.sell_price() - sell_fee) * size;

    let buy_step = ExecutionStep::new(
        format!(
            "BUY {size} YES on {} at {}",
            strategy.buy_venue().name(),
            strategy.buy_price()
        ),
        strategy.buy_venue(),
        strategy.buy_price(),
        size,
        buy_fee,
        buy_slippage,
        buy_net_cost,
        buy_url.map(str::to_string),
    );
    let sell_step = ExecutionStep::new(
        format!(
            "SELL {size} YES on {} at {}",
            strategy.sell_venue().name(),
            strategy.sell_price()
        ),
        strategy.sell_venue(),
        strategy.sell_price(),
        size,
        sell_fee,
        sell_slippage,
        sell_net_cost,
        sell_url.map(str::to_string),
    );

    ExecutionPlan::new(vec![buy_step, sell_step])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketMatch, MatchScores};
    use crate::status::NullPushBus;
    use crate::store::memory::{MemoryMarketStore, MemoryMatchStore, MemoryOpportunityStore};

    fn book(id: MarketId, bid: Decimal, ask: Decimal, size: Decimal) -> OrderBook {
        OrderBook::with_levels(
            id,
            vec![PriceLevel::new(bid, size)],
            vec![PriceLevel::new(ask, size)],
            Utc::now(),
            20,
        )
    }

    fn market(venue: Venue, id: &str) -> Market {
        Market::new(
            MarketId::new(venue, id),
            "q",
            vec!["Yes".into(), "No".into()],
            Decimal::new(1, 2),
            Decimal::ONE,
            Decimal::ZERO,
        )
    }

    async fn setup() -> (Detector, MarketId, MarketId, Arc<MemoryOpportunityStore>) {
        let cache = Arc::new(OrderBookCache::new());
        let markets = Arc::new(MemoryMarketStore::new());
        let matches = Arc::new(MemoryMatchStore::new());
        let opportunities = Arc::new(MemoryOpportunityStore::new());

        let source = MarketId::new(Venue::Polymarket, "p1");
        let target = MarketId::new(Venue::Kalshi, "k1");

        markets.upsert(&market(Venue::Polymarket, "p1")).await.unwrap();
        markets.upsert(&market(Venue::Kalshi, "k1")).await.unwrap();

        cache.update(book(source.clone(), dec!(0.38), dec!(0.40), dec!(500)));
        cache.update(book(target.clone(), dec!(0.46), dec!(0.48), dec!(500)));

        let mut m = MarketMatch::new(
            source.clone(),
            target.clone(),
            MatchScores::combine(0.9, 0.8, 1.0, 0.9),
            vec![],
            "r",
        );
        m.confirm();
        matches.upsert(&m).await.unwrap();

        let detector = Detector::new(
            cache,
            markets,
            matches,
            opportunities.clone(),
            Arc::new(NullPushBus),
            ThresholdsConfig::default(),
        );
        (detector, source, target, opportunities)
    }

    #[tokio::test]
    async fn emits_opportunity_for_profitable_spread() {
        let (detector, _source, _target, opportunities) = setup().await;
        let emitted = detector.scan_once().await.unwrap();
        assert_eq!(emitted, 1);
        let active = opportunities.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(active[0].profit().net_profit() > Decimal::ZERO);
    }

    #[tokio::test]
    async fn skips_when_spread_is_negative() {
        let cache = Arc::new(OrderBookCache::new());
        let markets = Arc::new(MemoryMarketStore::new());
        let matches = Arc::new(MemoryMatchStore::new());
        let opportunities = Arc::new(MemoryOpportunityStore::new());

        let source = MarketId::new(Venue::Polymarket, "p1");
        let target = MarketId::new(Venue::Kalshi, "k1");
        markets.upsert(&market(Venue::Polymarket, "p1")).await.unwrap();
        markets.upsert(&market(Venue::Kalshi, "k1")).await.unwrap();

        cache.update(book(source.clone(), dec!(0.40), dec!(0.60), dec!(500)));
        cache.update(book(target.clone(), dec!(0.41), dec!(0.61), dec!(500)));

        let mut m = MarketMatch::new(
            source,
            target,
            MatchScores::combine(0.9, 0.8, 1.0, 0.9),
            vec![],
            "r",
        );
        m.confirm();
        matches.upsert(&m).await.unwrap();

        let detector = Detector::new(
            cache,
            markets,
            matches,
            opportunities.clone(),
            Arc::new(NullPushBus),
            ThresholdsConfig::default(),
        );
        assert_eq!(detector.scan_once().await.unwrap(), 0);
        assert!(opportunities.list_active().await.unwrap().is_empty());
    }

    #[test]
    fn simulate_fill_computes_weighted_average() {
        let levels = vec![
            PriceLevel::new(dec!(0.40), dec!(100)),
            PriceLevel::new(dec!(0.41), dec!(100)),
        ];
        let (avg, total, slippage) =
            simulate_fill(&levels, dec!(0.40), |p, top| p <= top * BAND_UP).unwrap();
        assert_eq!(total, dec!(200));
        assert_eq!(avg, dec!(0.405));
        assert_eq!(slippage, dec!(0.005));
    }
}
