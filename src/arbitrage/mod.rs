//! Arbitrage detection: per-confirmed-match fill simulation, profit, and
//! confidence scoring, run on a tight independent loop.

pub mod detector;

pub use detector::Detector;
