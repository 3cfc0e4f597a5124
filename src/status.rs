//! The §6 status/health JSON snapshot and the external push-bus contract.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::domain::{MarketStatus, OpportunityStatus};
use crate::error::Result;
use crate::exchange::{AdapterRegistry, HealthStatus};
use crate::ingestion::IngestionStats;
use crate::ingestion::events::PushEvent;
use crate::store::{MarketStore, MatchStore, OpportunityStore};

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStatus {
    pub status: &'static str,
    #[serde(rename = "marketCount")]
    pub market_count: u64,
    #[serde(rename = "lastFetch")]
    pub last_fetch: Option<DateTime<Utc>>,
    #[serde(rename = "avgLatencyMs")]
    pub avg_latency_ms: Option<f64>,
    #[serde(rename = "consecutiveErrors")]
    pub consecutive_errors: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionSectionStatus {
    #[serde(rename = "marketsIngested")]
    pub markets_ingested: u64,
    #[serde(rename = "orderbooksUpdated")]
    pub orderbooks_updated: u64,
    #[serde(rename = "quotesUpdated")]
    pub quotes_updated: u64,
    #[serde(rename = "errorsCount")]
    pub errors_count: u64,
    #[serde(rename = "lastFullSyncAt")]
    pub last_full_sync_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchingSectionStatus {
    #[serde(rename = "confirmedMatches")]
    pub confirmed_matches: u64,
    #[serde(rename = "pendingReview")]
    pub pending_review: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopOpportunity {
    pub id: String,
    pub spread: f64,
    pub confidence: f64,
    #[serde(rename = "maxSize")]
    pub max_size: f64,
    #[serde(rename = "ageSeconds")]
    pub age_seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArbitrageSectionStatus {
    #[serde(rename = "activeCount")]
    pub active_count: u64,
    #[serde(rename = "topOpportunities")]
    pub top_opportunities: Vec<TopOpportunity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSectionStatus {
    pub uptime: String,
    #[serde(rename = "memoryMB")]
    pub memory_mb: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub platforms: HashMap<String, PlatformStatus>,
    pub ingestion: IngestionSectionStatus,
    pub matching: MatchingSectionStatus,
    pub arbitrage: ArbitrageSectionStatus,
    pub system: SystemSectionStatus,
}

/// How many opportunities are surfaced in `arbitrage.topOpportunities`.
const TOP_OPPORTUNITIES_LIMIT: usize = 5;

fn health_status_label(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "HEALTHY",
        HealthStatus::Degraded => "DEGRADED",
        HealthStatus::Offline => "OFFLINE",
    }
}

/// "3d 14h 22m" style uptime string.
fn format_uptime(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(started_at);
    let total_minutes = duration.num_minutes().max(0);
    let days = duration.num_days().max(0);
    let hours = duration.num_hours().max(0) % 24;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Resident set size of this process, in megabytes. No crate in this stack
/// samples process memory, so this reads `/proc/self/statm` directly;
/// returns `None` off Linux or if the read fails.
fn resident_memory_mb() -> Option<f64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    let page_size = 4096u64;
    Some((resident_pages * page_size) as f64 / (1024.0 * 1024.0))
}

/// Build the full status snapshot by reading the adapter registry's health,
/// the ingestion counters, and the match/opportunity stores.
pub async fn build_snapshot(
    adapters: &AdapterRegistry,
    ingestion_stats: &IngestionStats,
    markets: &dyn MarketStore,
    matches: &dyn MatchStore,
    opportunities: &dyn OpportunityStore,
    started_at: DateTime<Utc>,
) -> Result<StatusSnapshot> {
    let now = Utc::now();
    let active_markets = markets.list_active().await?;

    let mut platforms = HashMap::new();
    for (venue, adapter) in adapters.iter() {
        let health = adapter.health();
        let market_count = active_markets
            .iter()
            .filter(|m| m.market_id().venue() == venue && m.status() == MarketStatus::Active)
            .count() as u64;
        platforms.insert(
            venue.tag().to_string(),
            PlatformStatus {
                status: health_status_label(health.status()),
                market_count,
                last_fetch: None,
                avg_latency_ms: health.average_latency_ms(),
                consecutive_errors: health.consecutive_errors(),
            },
        );
    }

    let confirmed = matches.list_confirmed().await?.len() as u64;
    let pending = matches.list_pending().await?.len() as u64;

    let active_opportunities = opportunities.list_active().await?;
    let mut sorted = active_opportunities.clone();
    sorted.sort_by(|a, b| b.profit().net_profit().cmp(&a.profit().net_profit()));

    let top_opportunities = sorted
        .into_iter()
        .take(TOP_OPPORTUNITIES_LIMIT)
        .map(|opp| TopOpportunity {
            id: opp.id().to_string(),
            spread: opp.profit().gross_spread().to_f64().unwrap_or(0.0),
            confidence: opp.confidence().overall(),
            max_size: opp.profit().max_executable_size().to_f64().unwrap_or(0.0),
            age_seconds: (now - opp.detected_at()).num_seconds().max(0),
        })
        .collect();

    Ok(StatusSnapshot {
        platforms,
        ingestion: IngestionSectionStatus {
            markets_ingested: ingestion_stats.markets_ingested(),
            orderbooks_updated: ingestion_stats.orderbooks_updated(),
            quotes_updated: ingestion_stats.quotes_updated(),
            errors_count: ingestion_stats.errors_count(),
            last_full_sync_at: ingestion_stats.last_full_sync_at(),
        },
        matching: MatchingSectionStatus {
            confirmed_matches: confirmed,
            pending_review: pending,
        },
        arbitrage: ArbitrageSectionStatus {
            active_count: active_opportunities
                .iter()
                .filter(|o| o.status() == OpportunityStatus::Active)
                .count() as u64,
            top_opportunities,
        },
        system: SystemSectionStatus {
            uptime: format_uptime(started_at, now),
            memory_mb: resident_memory_mb(),
            timestamp: now,
        },
    })
}

/// External push bus the core notifies, kept as a trait so a real
/// collaborator (e.g. a websocket fan-out service) can subscribe without
/// this crate depending on its transport.
#[async_trait]
pub trait PushBus: Send + Sync {
    async fn publish(&self, event: PushEvent);
}

/// A `PushBus` that drops every event; used when no collaborator is wired
/// up (e.g. the `cli check` command, tests).
pub struct NullPushBus;

#[async_trait]
impl PushBus for NullPushBus {
    async fn publish(&self, _event: PushEvent) {}
}
