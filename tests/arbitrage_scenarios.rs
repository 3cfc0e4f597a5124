//! End-to-end scenarios over the detector and matcher, fixture numbers
//! adapted from the two fixed venue fee schedules this crate ships
//! (Polymarket 0%, Kalshi 1%) rather than the illustrative 2%/1% pair.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use rust_decimal_macros::dec;

use arbitrex::arbitrage::Detector;
use arbitrex::cache::OrderBookCache;
use arbitrex::config::ThresholdsConfig;
use arbitrex::domain::{
    Market, MarketId, MarketMatch, MatchScores, OrderBook, PriceLevel, Venue,
};
use arbitrex::error::{Error, Result, VenueErrorKind};
use arbitrex::exchange::{AdapterRegistry, HealthStatus, VenueAdapter, VenueHealth};
use arbitrex::ingestion::{events::IngestionEvent, IngestionOrchestrator};
use arbitrex::matching::Matcher;
use arbitrex::status::NullPushBus;
use arbitrex::store::memory::{
    MemoryMarketStore, MemoryMatchStore, MemoryOpportunityStore, MemorySnapshotStore,
};
use arbitrex::store::{MarketStore, MatchStore, OpportunityStore};
use arbitrex::testkit::domain::market;

fn confirmed_match(source: MarketId, target: MarketId, overall: f64) -> MarketMatch {
    let scores = MatchScores {
        semantic: overall,
        resolution: overall,
        date: overall,
        category: overall,
        overall,
    };
    let mut m = MarketMatch::new(source, target, scores, vec!["trump".into()], "test fixture");
    m.confirm();
    m
}

fn book_at(id: MarketId, bid: PriceLevel, ask: PriceLevel, age_ms: i64) -> OrderBook {
    OrderBook::with_levels(
        id,
        vec![bid],
        vec![ask],
        Utc::now() - ChronoDuration::milliseconds(age_ms),
        20,
    )
}

/// S1 — happy arb: a thick spread with fees under the fixed 0%/1% schedule
/// still nets a healthy profit, high confidence, opportunity emitted.
#[tokio::test]
async fn s1_happy_arb_emits_opportunity() {
    let cache = Arc::new(OrderBookCache::new());
    let markets = Arc::new(MemoryMarketStore::new());
    let matches = Arc::new(MemoryMatchStore::new());
    let opportunities = Arc::new(MemoryOpportunityStore::new());

    let poly_id = MarketId::new(Venue::Polymarket, "p1");
    let kalshi_id = MarketId::new(Venue::Kalshi, "k1");

    markets
        .upsert(&market(Venue::Polymarket, "p1", "Will X happen?"))
        .await
        .unwrap();
    markets
        .upsert(&market(Venue::Kalshi, "k1", "Will X happen?"))
        .await
        .unwrap();

    cache.update(book_at(
        poly_id.clone(),
        PriceLevel::new(dec!(0.38), dec!(500)),
        PriceLevel::new(dec!(0.40), dec!(500)),
        500,
    ));
    cache.update(book_at(
        kalshi_id.clone(),
        PriceLevel::new(dec!(0.46), dec!(500)),
        PriceLevel::new(dec!(0.48), dec!(500)),
        500,
    ));

    matches
        .upsert(&confirmed_match(poly_id.clone(), kalshi_id.clone(), 0.9))
        .await
        .unwrap();

    let detector = Detector::new(
        cache,
        markets,
        matches,
        opportunities.clone(),
        Arc::new(NullPushBus),
        ThresholdsConfig::default(),
    );
    let emitted = detector.scan_once().await.unwrap();
    assert_eq!(emitted, 1);

    let opp = &opportunities.list_active().await.unwrap()[0];
    assert_eq!(opp.profit().gross_spread(), dec!(0.06));
    assert_eq!(opp.profit().max_executable_size(), dec!(500));
    let net_profit = opp.profit().net_profit().to_string().parse::<f64>().unwrap();
    assert!((net_profit - 27.7).abs() < 0.01, "net_profit was {net_profit}");
    let confidence = opp.confidence().overall();
    assert!((confidence - 0.7566).abs() < 0.005, "confidence was {confidence}");
}

/// S2 — a one-tick spread that the buy-side taker fee eats entirely in
/// both directions. No opportunity emitted.
#[tokio::test]
async fn s2_fees_kill_thin_spread() {
    let cache = Arc::new(OrderBookCache::new());
    let markets = Arc::new(MemoryMarketStore::new());
    let matches = Arc::new(MemoryMatchStore::new());
    let opportunities = Arc::new(MemoryOpportunityStore::new());

    let kalshi_id = MarketId::new(Venue::Kalshi, "k1");
    let poly_id = MarketId::new(Venue::Polymarket, "p1");

    markets.upsert(&market(Venue::Kalshi, "k1", "q")).await.unwrap();
    markets.upsert(&market(Venue::Polymarket, "p1", "q")).await.unwrap();

    cache.update(book_at(
        kalshi_id.clone(),
        PriceLevel::new(dec!(0.495), dec!(500)),
        PriceLevel::new(dec!(0.500), dec!(500)),
        500,
    ));
    cache.update(book_at(
        poly_id.clone(),
        PriceLevel::new(dec!(0.501), dec!(500)),
        PriceLevel::new(dec!(0.502), dec!(500)),
        500,
    ));

    matches
        .upsert(&confirmed_match(kalshi_id, poly_id, 0.9))
        .await
        .unwrap();

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

/// S3 — the buy-side book is older than `orderbook_stale_threshold_ms`; the
/// detector must skip the pair without ever computing fees.
#[tokio::test]
async fn s3_stale_book_skips_pair() {
    let cache = Arc::new(OrderBookCache::new());
    let markets = Arc::new(MemoryMarketStore::new());
    let matches = Arc::new(MemoryMatchStore::new());
    let opportunities = Arc::new(MemoryOpportunityStore::new());

    let poly_id = MarketId::new(Venue::Polymarket, "p1");
    let kalshi_id = MarketId::new(Venue::Kalshi, "k1");

    markets.upsert(&market(Venue::Polymarket, "p1", "q")).await.unwrap();
    markets.upsert(&market(Venue::Kalshi, "k1", "q")).await.unwrap();

    // 4500 ms old, past the default 3000 ms threshold.
    cache.update(book_at(
        poly_id.clone(),
        PriceLevel::new(dec!(0.38), dec!(500)),
        PriceLevel::new(dec!(0.40), dec!(500)),
        4500,
    ));
    cache.update(book_at(
        kalshi_id.clone(),
        PriceLevel::new(dec!(0.46), dec!(500)),
        PriceLevel::new(dec!(0.48), dec!(500)),
        500,
    ));

    matches
        .upsert(&confirmed_match(poly_id, kalshi_id, 0.9))
        .await
        .unwrap();

    let detector = Detector::new(
        cache,
        markets,
        matches,
        opportunities.clone(),
        Arc::new(NullPushBus),
        ThresholdsConfig::default(),
    );
    assert_eq!(detector.scan_once().await.unwrap(), 0);
}

/// S4 — the buy-side ask runs two levels within the 5% band; the fillable
/// size and slippage come from the depth-weighted average, not the top tick.
#[tokio::test]
async fn s4_depth_limited_size_uses_weighted_average() {
    let cache = Arc::new(OrderBookCache::new());
    let markets = Arc::new(MemoryMarketStore::new());
    let matches = Arc::new(MemoryMatchStore::new());
    let opportunities = Arc::new(MemoryOpportunityStore::new());

    let poly_id = MarketId::new(Venue::Polymarket, "p1");
    let kalshi_id = MarketId::new(Venue::Kalshi, "k1");

    markets.upsert(&market(Venue::Polymarket, "p1", "q")).await.unwrap();
    markets.upsert(&market(Venue::Kalshi, "k1", "q")).await.unwrap();

    let buy_book = OrderBook::with_levels(
        poly_id.clone(),
        vec![PriceLevel::new(dec!(0.38), dec!(500))],
        vec![
            PriceLevel::new(dec!(0.40), dec!(20)),
            PriceLevel::new(dec!(0.41), dec!(200)),
        ],
        Utc::now(),
        20,
    );
    let sell_book = book_at(
        kalshi_id.clone(),
        PriceLevel::new(dec!(0.46), dec!(500)),
        PriceLevel::new(dec!(0.48), dec!(500)),
        500,
    );
    cache.update(buy_book);
    cache.update(sell_book);

    matches
        .upsert(&confirmed_match(poly_id, kalshi_id, 0.9))
        .await
        .unwrap();

    let detector = Detector::new(
        cache,
        markets,
        matches,
        opportunities.clone(),
        Arc::new(NullPushBus),
        ThresholdsConfig::default(),
    );
    assert_eq!(detector.scan_once().await.unwrap(), 1);

    let opp = &opportunities.list_active().await.unwrap()[0];
    assert_eq!(opp.profit().max_executable_size(), dec!(220));
    let net_profit = opp.profit().net_profit().to_string().parse::<f64>().unwrap();
    assert!((net_profit - 11.188).abs() < 0.01, "net_profit was {net_profit}");
}

/// S5 — a matcher candidate whose end dates differ by more than 30 days
/// never gets scored, so no `MarketMatch` is produced.
#[tokio::test]
async fn s5_matcher_prefilter_by_date() {
    let markets = Arc::new(MemoryMarketStore::new());
    let matches = Arc::new(MemoryMatchStore::new());

    let mut x = market(Venue::Polymarket, "x", "Will the index close above 5000?");
    x.set_end_date("2024-11-05T00:00:00Z".parse().unwrap());
    let mut y = market(Venue::Kalshi, "y", "Will the index close above 5000?");
    y.set_end_date("2025-03-01T00:00:00Z".parse().unwrap());

    markets.upsert(&x).await.unwrap();
    markets.upsert(&y).await.unwrap();

    let matcher = Matcher::new(markets, matches.clone());
    let upserted = matcher.run_once().await.unwrap();
    assert_eq!(upserted, 0);
    assert!(matches.list_pending().await.unwrap().is_empty());
}

/// A `VenueAdapter` whose market fetch fails a fixed number of times, then
/// always succeeds — used to drive a venue into `Offline` via ten
/// consecutive errors (S6).
struct FlakyAdapter {
    venue: Venue,
    remaining_failures: Mutex<u32>,
    health: Mutex<VenueHealth>,
}

impl FlakyAdapter {
    fn new(venue: Venue, failures: u32) -> Self {
        Self {
            venue,
            remaining_failures: Mutex::new(failures),
            health: Mutex::new(VenueHealth::new()),
        }
    }
}

#[async_trait]
impl VenueAdapter for FlakyAdapter {
    fn venue(&self) -> Venue {
        self.venue
    }

    async fn fetch_active_markets(&self) -> Result<(Vec<Market>, u64)> {
        let mut remaining = self.remaining_failures.lock();
        if *remaining > 0 {
            *remaining -= 1;
            self.health.lock().record_failure();
            return Err(Error::Venue {
                venue: self.venue.tag().to_string(),
                kind: VenueErrorKind::Transient,
                message: "simulated outage".to_string(),
            });
        }
        self.health.lock().record_success(10);
        Ok((vec![], 10))
    }

    async fn fetch_order_book(&self, _external_id: &str) -> Result<(Option<OrderBook>, u64)> {
        Ok((None, 0))
    }

    async fn fetch_quote(&self, _external_id: &str) -> Result<(Option<arbitrex::domain::Quote>, u64)> {
        Ok((None, 0))
    }

    async fn start_push(
        &self,
        _subscribed_ids: Vec<String>,
        _sink: tokio::sync::mpsc::Sender<IngestionEvent>,
    ) -> Result<()> {
        Ok(())
    }

    async fn stop_push(&self) {}

    fn health(&self) -> VenueHealth {
        self.health.lock().clone()
    }
}

/// S6 — a venue that fails ten consecutive times goes `Offline`; the full
/// sync still completes through the remaining venue.
#[tokio::test]
async fn s6_venue_outage_goes_offline_without_blocking_sync() {
    let cache = Arc::new(OrderBookCache::new());
    let markets: Arc<MemoryMarketStore> = Arc::new(MemoryMarketStore::new());
    let snapshots = Arc::new(MemorySnapshotStore::new());

    let mut adapters: HashMap<Venue, Arc<dyn VenueAdapter>> = HashMap::new();
    adapters.insert(Venue::Kalshi, Arc::new(FlakyAdapter::new(Venue::Kalshi, 10)));
    adapters.insert(Venue::Polymarket, Arc::new(FlakyAdapter::new(Venue::Polymarket, 0)));
    let registry = Arc::new(AdapterRegistry::from_adapters(adapters));

    let orchestrator = IngestionOrchestrator::new(
        registry.clone(),
        cache,
        markets.clone(),
        snapshots,
    );

    for _ in 0..10 {
        orchestrator.full_sync().await.unwrap();
    }

    let kalshi_health = registry.get(Venue::Kalshi).unwrap().health();
    assert_eq!(kalshi_health.status(), HealthStatus::Offline);
    assert_eq!(kalshi_health.consecutive_errors(), 10);

    let poly_health = registry.get(Venue::Polymarket).unwrap().health();
    assert_eq!(poly_health.status(), HealthStatus::Healthy);

    // Every sync call completed despite Kalshi's failures every round.
    assert_eq!(orchestrator.stats().errors_count(), 10);
}
