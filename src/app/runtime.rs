//! Wires the four independent loops (full sync, targeted refresh + push
//! fan-in, matcher, detector) from one `AppState` and runs them until
//! Ctrl-C, honoring a 30 s deadline for in-flight work on shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use super::state::AppState;
use crate::domain::Venue;
use crate::error::Result;
use crate::ingestion::IngestionOrchestrator;

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

pub struct Runtime {
    state: Arc<AppState>,
}

impl Runtime {
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Build `{venue -> external_id}` for every active market, the
    /// subscription set both the targeted-refresh loop and the push
    /// workers key off.
    async fn subscription_map(&self) -> Result<HashMap<Venue, Vec<String>>> {
        let mut subscribed: HashMap<Venue, Vec<String>> = HashMap::new();
        for market in self.state.markets.list_active().await? {
            subscribed
                .entry(market.market_id().venue())
                .or_default()
                .push(market.market_id().external_id().to_string());
        }
        Ok(subscribed)
    }

    /// Run every loop until Ctrl-C, then stop push workers and let
    /// in-flight ticks drain within `SHUTDOWN_DEADLINE`.
    pub async fn run(self) -> Result<()> {
        let ingestion = Arc::new(self.state.ingestion_orchestrator());
        let stop = Arc::new(Notify::new());

        info!("running initial full sync");
        ingestion.full_sync().await?;
        let subscribed = self.subscription_map().await?;

        let mut event_rx = ingestion.start_push_workers(&subscribed).await?;

        let full_sync_task = tokio::spawn(full_sync_loop(
            ingestion.clone(),
            self.state.config.intervals.full_sync_interval_ms,
            stop.clone(),
        ));
        let refresh_task = tokio::spawn(targeted_refresh_loop(
            ingestion.clone(),
            self.state.clone(),
            self.state.config.intervals.ingestion_interval_ms,
            stop.clone(),
        ));
        let matcher_task = tokio::spawn(matcher_loop(
            self.state.clone(),
            self.state.config.intervals.matching_interval_ms,
            stop.clone(),
        ));
        let detector_task = tokio::spawn(detector_loop(
            self.state.clone(),
            self.state.config.intervals.arbitrage_scan_interval_ms,
            stop.clone(),
        ));

        let push_bus = self.state.push_bus.clone();
        let fanin_stop = stop.clone();
        let fanin_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = fanin_stop.notified() => break,
                    event = event_rx.recv() => {
                        match event {
                            Some(event) => {
                                if let Some(push_event) = event.as_push_event() {
                                    push_bus.publish(push_event).await;
                                }
                                ingestion.apply_event(event).await;
                            }
                            None => break,
                        }
                    }
                }
            }
        });

        if signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
        }

        self.shutdown(
            stop,
            full_sync_task,
            refresh_task,
            matcher_task,
            detector_task,
            fanin_task,
        )
        .await
    }

    async fn shutdown(
        &self,
        stop: Arc<Notify>,
        full_sync_task: tokio::task::JoinHandle<()>,
        refresh_task: tokio::task::JoinHandle<()>,
        matcher_task: tokio::task::JoinHandle<()>,
        detector_task: tokio::task::JoinHandle<()>,
        fanin_task: tokio::task::JoinHandle<()>,
    ) -> Result<()> {
        stop.notify_waiters();
        self.state.ingestion_orchestrator().stop_push_workers().await;

        let drain = async {
            let _ = tokio::join!(
                full_sync_task,
                refresh_task,
                matcher_task,
                detector_task,
                fanin_task,
            );
        };

        if tokio::time::timeout(SHUTDOWN_DEADLINE, drain).await.is_err() {
            warn!("shutdown deadline elapsed with loops still in flight");
        }

        info!("runtime stopped");
        Ok(())
    }
}

async fn full_sync_loop(
    ingestion: Arc<IngestionOrchestrator>,
    interval_ms: u64,
    stop: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    ticker.tick().await; // first tick fires immediately; the caller already ran one full sync
    loop {
        tokio::select! {
            _ = stop.notified() => break,
            _ = ticker.tick() => {
                if let Err(error) = ingestion.full_sync().await {
                    error!(%error, "full sync failed");
                }
            }
        }
    }
}

async fn targeted_refresh_loop(
    ingestion: Arc<IngestionOrchestrator>,
    state: Arc<AppState>,
    interval_ms: u64,
    stop: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    loop {
        tokio::select! {
            _ = stop.notified() => break,
            _ = ticker.tick() => {
                let subscribed = match state.markets.list_active().await {
                    Ok(markets) => {
                        let mut map: HashMap<Venue, Vec<String>> = HashMap::new();
                        for market in markets {
                            map.entry(market.market_id().venue())
                                .or_default()
                                .push(market.market_id().external_id().to_string());
                        }
                        map
                    }
                    Err(error) => {
                        error!(%error, "failed to list active markets for targeted refresh");
                        continue;
                    }
                };
                if let Err(error) = ingestion.targeted_refresh(&subscribed).await {
                    error!(%error, "targeted refresh failed");
                }
            }
        }
    }
}

async fn matcher_loop(state: Arc<AppState>, interval_ms: u64, stop: Arc<Notify>) {
    let matcher = state.matcher();
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    loop {
        tokio::select! {
            _ = stop.notified() => break,
            _ = ticker.tick() => {
                match matcher.run_once().await {
                    Ok(count) => info!(count, "matcher pass complete"),
                    Err(error) => error!(%error, "matcher pass failed"),
                }
            }
        }
    }
}

async fn detector_loop(state: Arc<AppState>, interval_ms: u64, stop: Arc<Notify>) {
    let detector = state.detector();
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    loop {
        tokio::select! {
            _ = stop.notified() => break,
            _ = ticker.tick() => {
                match detector.scan_once().await {
                    Ok(count) => {
                        if count > 0 {
                            info!(count, "arbitrage opportunities emitted");
                        }
                    }
                    Err(error) => error!(%error, "detector scan failed"),
                }
            }
        }
    }
}
