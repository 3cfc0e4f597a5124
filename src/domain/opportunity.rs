//! Detected arbitrage opportunities: strategy, profit analysis, confidence,
//! and execution plan.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::market::MarketId;
use super::venue::Venue;

/// Which side of each market the strategy buys/sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    BuyYesSellYes,
    BuyNoSellNo,
    BuyYesSellNo,
    BuyNoSellYes,
}

/// The directional trade: buy on one venue, sell the economically
/// equivalent leg on the other, for a given executable size.
#[derive(Debug, Clone)]
pub struct Strategy {
    action: Action,
    buy_venue: Venue,
    buy_price: Decimal,
    sell_venue: Venue,
    sell_price: Decimal,
    size: Decimal,
}

impl Strategy {
    #[must_use]
    pub const fn new(
        action: Action,
        buy_venue: Venue,
        buy_price: Decimal,
        sell_venue: Venue,
        sell_price: Decimal,
        size: Decimal,
    ) -> Self {
        Self {
            action,
            buy_venue,
            buy_price,
            sell_venue,
            sell_price,
            size,
        }
    }

    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    #[must_use]
    pub const fn buy_venue(&self) -> Venue {
        self.buy_venue
    }

    #[must_use]
    pub const fn buy_price(&self) -> Decimal {
        self.buy_price
    }

    #[must_use]
    pub const fn sell_venue(&self) -> Venue {
        self.sell_venue
    }

    #[must_use]
    pub const fn sell_price(&self) -> Decimal {
        self.sell_price
    }

    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.size
    }
}

/// Fees, slippage, and profit derived from a simulated fill.
#[derive(Debug, Clone, Copy)]
pub struct ProfitAnalysis {
    gross_spread: Decimal,
    total_fees: Decimal,
    estimated_slippage: Decimal,
    net_profit: Decimal,
    roi: Decimal,
    annualized_roi: Decimal,
    max_executable_size: Decimal,
}

impl ProfitAnalysis {
    #[must_use]
    pub const fn new(
        gross_spread: Decimal,
        total_fees: Decimal,
        estimated_slippage: Decimal,
        net_profit: Decimal,
        roi: Decimal,
        annualized_roi: Decimal,
        max_executable_size: Decimal,
    ) -> Self {
        Self {
            gross_spread,
            total_fees,
            estimated_slippage,
            net_profit,
            roi,
            annualized_roi,
            max_executable_size,
        }
    }

    #[must_use]
    pub const fn gross_spread(&self) -> Decimal {
        self.gross_spread
    }

    #[must_use]
    pub const fn total_fees(&self) -> Decimal {
        self.total_fees
    }

    #[must_use]
    pub const fn estimated_slippage(&self) -> Decimal {
        self.estimated_slippage
    }

    #[must_use]
    pub const fn net_profit(&self) -> Decimal {
        self.net_profit
    }

    #[must_use]
    pub const fn roi(&self) -> Decimal {
        self.roi
    }

    #[must_use]
    pub const fn annualized_roi(&self) -> Decimal {
        self.annualized_roi
    }

    #[must_use]
    pub const fn max_executable_size(&self) -> Decimal {
        self.max_executable_size
    }
}

/// The detector's confidence that an opportunity is real and executable.
#[derive(Debug, Clone, Copy)]
pub struct Confidence {
    overall: f64,
    freshness: f64,
    liquidity: f64,
    match_quality: f64,
    data_age_ms: i64,
}

impl Confidence {
    /// Recompute `overall` from the three weighted sub-scores, per the
    /// detector's `0.35·freshness + 0.30·liquidity + 0.35·match_quality`.
    #[must_use]
    pub fn new(freshness: f64, liquidity: f64, match_quality: f64, data_age_ms: i64) -> Self {
        let overall = 0.35 * freshness + 0.30 * liquidity + 0.35 * match_quality;
        Self {
            overall,
            freshness,
            liquidity,
            match_quality,
            data_age_ms,
        }
    }

    #[must_use]
    pub const fn overall(&self) -> f64 {
        self.overall
    }

    #[must_use]
    pub const fn freshness(&self) -> f64 {
        self.freshness
    }

    #[must_use]
    pub const fn liquidity(&self) -> f64 {
        self.liquidity
    }

    #[must_use]
    pub const fn match_quality(&self) -> f64 {
        self.match_quality
    }

    #[must_use]
    pub const fn data_age_ms(&self) -> i64 {
        self.data_age_ms
    }
}

/// One leg of an execution plan.
#[derive(Debug, Clone)]
pub struct ExecutionStep {
    instruction: String,
    venue: Venue,
    price: Decimal,
    size: Decimal,
    fee: Decimal,
    slippage: Decimal,
    net_cost: Decimal,
    venue_url: Option<String>,
}

impl ExecutionStep {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instruction: impl Into<String>,
        venue: Venue,
        price: Decimal,
        size: Decimal,
        fee: Decimal,
        slippage: Decimal,
        net_cost: Decimal,
        venue_url: Option<String>,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            venue,
            price,
            size,
            fee,
            slippage,
            net_cost,
            venue_url,
        }
    }

    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    #[must_use]
    pub const fn venue(&self) -> Venue {
        self.venue
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.size
    }

    #[must_use]
    pub const fn fee(&self) -> Decimal {
        self.fee
    }

    #[must_use]
    pub const fn slippage(&self) -> Decimal {
        self.slippage
    }

    #[must_use]
    pub const fn net_cost(&self) -> Decimal {
        self.net_cost
    }

    #[must_use]
    pub fn venue_url(&self) -> Option<&str> {
        self.venue_url.as_deref()
    }
}

/// Ordered steps an operator (or an execution collaborator) would take.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    steps: Vec<ExecutionStep>,
}

impl ExecutionPlan {
    #[must_use]
    pub const fn new(steps: Vec<ExecutionStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }
}

/// Lifecycle state of a detected opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpportunityStatus {
    Active,
    Expired,
    Executed,
    Missed,
}

/// Risk band for a partial-fill scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

/// A derived, not-persisted projection of profit if only part of the size
/// fills.
#[derive(Debug, Clone)]
pub struct PartialFillScenario {
    pub pct: u8,
    pub filled_qty: Decimal,
    pub adjusted_profit: Decimal,
    pub risk: RiskBand,
    pub recommendation: String,
}

/// A specific, timestamped arbitrage instance detected for a confirmed
/// market match.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    id: Uuid,
    source_market: MarketId,
    target_market: MarketId,
    strategy: Strategy,
    profit: ProfitAnalysis,
    confidence: Confidence,
    execution_plan: ExecutionPlan,
    status: OpportunityStatus,
    detected_at: DateTime<Utc>,
    source_data_age_ms: i64,
    target_data_age_ms: i64,
}

impl ArbitrageOpportunity {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        source_market: MarketId,
        target_market: MarketId,
        strategy: Strategy,
        profit: ProfitAnalysis,
        confidence: Confidence,
        execution_plan: ExecutionPlan,
        detected_at: DateTime<Utc>,
        source_data_age_ms: i64,
        target_data_age_ms: i64,
    ) -> Self {
        Self {
            id,
            source_market,
            target_market,
            strategy,
            profit,
            confidence,
            execution_plan,
            status: OpportunityStatus::Active,
            detected_at,
            source_data_age_ms,
            target_data_age_ms,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
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
    pub const fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    #[must_use]
    pub const fn profit(&self) -> &ProfitAnalysis {
        &self.profit
    }

    #[must_use]
    pub const fn confidence(&self) -> &Confidence {
        &self.confidence
    }

    #[must_use]
    pub const fn execution_plan(&self) -> &ExecutionPlan {
        &self.execution_plan
    }

    #[must_use]
    pub const fn status(&self) -> OpportunityStatus {
        self.status
    }

    #[must_use]
    pub const fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    #[must_use]
    pub const fn source_data_age_ms(&self) -> i64 {
        self.source_data_age_ms
    }

    #[must_use]
    pub const fn target_data_age_ms(&self) -> i64 {
        self.target_data_age_ms
    }

    pub fn expire(&mut self) {
        self.status = OpportunityStatus::Expired;
    }

    pub fn mark_executed(&mut self) {
        self.status = OpportunityStatus::Executed;
    }

    pub fn mark_missed(&mut self) {
        self.status = OpportunityStatus::Missed;
    }

    /// `net_profit > 0 ∧ max_executable_size ≥ floor ∧ confidence.overall ≥
    /// min_confidence ∧ max(source_age, target_age) ≤ stale_threshold`,
    /// the active-opportunity invariant.
    #[must_use]
    pub fn is_valid_active(&self, min_executable_size: Decimal, min_confidence: f64, stale_threshold_ms: i64) -> bool {
        self.profit.net_profit() > Decimal::ZERO
            && self.profit.max_executable_size() >= min_executable_size
            && self.confidence.overall() >= min_confidence
            && self.source_data_age_ms.max(self.target_data_age_ms) <= stale_threshold_ms
    }

    /// Derived partial-fill scenarios at 25/50/75/100%, computed on access,
    /// not persisted.
    #[must_use]
    pub fn partial_fill_scenarios(&self) -> Vec<PartialFillScenario> {
        [25u8, 50, 75, 100]
            .into_iter()
            .map(|pct| {
                let frac = Decimal::from(pct) / Decimal::from(100);
                let filled_qty = self.profit.max_executable_size() * frac;
                let adjusted_profit = self.profit.net_profit() * frac;
                let risk = if pct >= 75 {
                    RiskBand::Low
                } else if pct >= 50 {
                    RiskBand::Medium
                } else {
                    RiskBand::High
                };
                let recommendation = match risk {
                    RiskBand::Low => {
                        "Full-size execution is likely achievable; proceed with both legs.".to_string()
                    }
                    RiskBand::Medium => {
                        "Partial fill is plausible at this depth; size down or split the order."
                            .to_string()
                    }
                    RiskBand::High => {
                        "Only a small fraction of size is likely to fill; treat as a best-effort leg."
                            .to_string()
                    }
                };
                PartialFillScenario {
                    pct,
                    filled_qty,
                    adjusted_profit,
                    risk,
                    recommendation,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> ArbitrageOpportunity {
        let strategy = Strategy::new(
            Action::BuyYesSellYes,
            Venue::Polymarket,
            dec!(0.40),
            Venue::Kalshi,
            dec!(0.46),
            dec!(500),
        );
        let profit = ProfitAnalysis::new(
            dec!(0.06),
            dec!(0.0126),
            dec!(0),
            dec!(23.70),
            dec!(0.114),
            dec!(41.6),
            dec!(500),
        );
        let confidence = Confidence::new(0.833, 0.5, 0.9, 500);
        let plan = ExecutionPlan::new(vec![]);
        ArbitrageOpportunity::new(
            Uuid::nil(),
            MarketId::new(Venue::Polymarket, "a"),
            MarketId::new(Venue::Kalshi, "b"),
            strategy,
            profit,
            confidence,
            plan,
            Utc::now(),
            500,
            500,
        )
    }

    #[test]
    fn confidence_overall_matches_weighted_formula() {
        let c = Confidence::new(0.833, 0.5, 0.9, 500);
        let expected = 0.35 * 0.833 + 0.30 * 0.5 + 0.35 * 0.9;
        assert!((c.overall() - expected).abs() < 1e-9);
    }

    #[test]
    fn is_valid_active_true_for_happy_path() {
        let opp = sample();
        assert!(opp.is_valid_active(dec!(10), 0.6, 3000));
    }

    #[test]
    fn is_valid_active_false_when_stale() {
        let opp = sample();
        assert!(!opp.is_valid_active(dec!(10), 0.6, 100));
    }

    #[test]
    fn partial_fill_scenarios_scale_linearly() {
        let opp = sample();
        let scenarios = opp.partial_fill_scenarios();
        assert_eq!(scenarios.len(), 4);
        let full = scenarios.iter().find(|s| s.pct == 100).unwrap();
        assert_eq!(full.filled_qty, dec!(500));
        assert_eq!(full.adjusted_profit, dec!(23.70));
        assert_eq!(full.risk, RiskBand::Low);

        let quarter = scenarios.iter().find(|s| s.pct == 25).unwrap();
        assert_eq!(quarter.filled_qty, dec!(125));
        assert_eq!(quarter.risk, RiskBand::High);
    }
}
