//! Cross-venue market equivalence proposals.

use serde::{Deserialize, Serialize};

use super::market::MarketId;

/// Review status of a proposed cross-venue equivalence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    PendingReview,
    Confirmed,
    Rejected,
    Stale,
}

/// The four sub-scores the matcher combines into `overall`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScores {
    pub semantic: f64,
    pub resolution: f64,
    pub date: f64,
    pub category: f64,
    pub overall: f64,
}

impl MatchScores {
    /// Weights from the matching spec: semantic 0.45, date 0.20,
    /// category 0.10, resolution 0.25.
    #[must_use]
    pub fn combine(semantic: f64, date: f64, category: f64, resolution: f64) -> Self {
        let overall = 0.45 * semantic + 0.20 * date + 0.10 * category + 0.25 * resolution;
        Self {
            semantic,
            resolution,
            date,
            category,
            overall,
        }
    }
}

/// A directional cross-venue pair proposal.
#[derive(Debug, Clone)]
pub struct MarketMatch {
    source_market: MarketId,
    target_market: MarketId,
    scores: MatchScores,
    matched_terms: Vec<String>,
    resolution_diff: Option<String>,
    match_reason: String,
    status: MatchStatus,
}

impl MarketMatch {
    pub fn new(
        source_market: MarketId,
        target_market: MarketId,
        scores: MatchScores,
        matched_terms: Vec<String>,
        match_reason: impl Into<String>,
    ) -> Self {
        Self {
            source_market,
            target_market,
            scores,
            matched_terms,
            resolution_diff: None,
            match_reason: match_reason.into(),
            status: MatchStatus::PendingReview,
        }
    }

    #[must_use]
    pub const fn source_market(&self) -> &MarketId {
        &self.source_market
    }

    #[must_use]
    pub const fn target_market(&self) -> &MarketId {
        &self.target_market
    }

    #[must_use]
    pub const fn scores(&self) -> MatchScores {
        self.scores
    }

    #[must_use]
    pub fn matched_terms(&self) -> &[String] {
        &self.matched_terms
    }

    #[must_use]
    pub fn resolution_diff(&self) -> Option<&str> {
        self.resolution_diff.as_deref()
    }

    #[must_use]
    pub fn match_reason(&self) -> &str {
        &self.match_reason
    }

    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn set_resolution_diff(&mut self, diff: impl Into<String>) -> &mut Self {
        self.resolution_diff = Some(diff.into());
        self
    }

    /// Upsert scores/reason in place without demoting status, per the
    /// matcher's idempotence contract: only promotion to `Stale` is allowed
    /// from the core, `Confirmed`/`Rejected` come from the review collaborator.
    pub fn update_scores(
        &mut self,
        scores: MatchScores,
        matched_terms: Vec<String>,
        match_reason: impl Into<String>,
    ) {
        self.scores = scores;
        self.matched_terms = matched_terms;
        self.match_reason = match_reason.into();
    }

    pub fn mark_stale(&mut self) {
        self.status = MatchStatus::Stale;
    }

    pub fn confirm(&mut self) {
        self.status = MatchStatus::Confirmed;
    }

    pub fn reject(&mut self) {
        self.status = MatchStatus::Rejected;
    }

    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self.status, MatchStatus::Confirmed)
    }
}
