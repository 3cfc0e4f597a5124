//! Pure domain types: no I/O, no async, fully unit-testable in isolation.

pub mod market;
pub mod market_match;
pub mod opportunity;
pub mod order_book;
pub mod quote;
pub mod venue;

pub use market::{DenormalizedQuote, Market, MarketId, MarketStatus};
pub use market_match::{MarketMatch, MatchScores, MatchStatus};
pub use opportunity::{
    Action, ArbitrageOpportunity, Confidence, ExecutionPlan, ExecutionStep, OpportunityStatus,
    PartialFillScenario, ProfitAnalysis, RiskBand, Strategy,
};
pub use order_book::{OrderBook, OrderBookDto, PriceLevel};
pub use quote::Quote;
pub use venue::{FeeSchedule, Venue};
