//! Cross-venue market matching: token pipeline, sub-score computation, and
//! the periodic matcher loop that upserts `MarketMatch` proposals.

pub mod matcher;
pub mod scoring;
pub mod text;

pub use matcher::Matcher;

/// Overall score at or above which a candidate pair is persisted as a
/// `MarketMatch` proposal.
pub const MATCH_THRESHOLD: f64 = 0.65;
