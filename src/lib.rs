//! Cross-venue prediction market arbitrage detection engine: venue
//! ingestion, cross-venue market matching, and arbitrage opportunity
//! detection over a short-TTL order book cache.

pub mod app;
pub mod arbitrage;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod ingestion;
pub mod matching;
pub mod status;
pub mod store;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
