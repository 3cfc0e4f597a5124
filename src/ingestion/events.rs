//! Typed events flowing from adapters into the orchestrator, replacing the
//! untyped publish/subscribe bus the source used.

use crate::domain::{Market, OrderBook, Quote, Venue};

/// One update emitted by a venue adapter's push (or polling) worker.
#[derive(Debug, Clone)]
pub enum IngestionEvent {
    OrderBook {
        venue: Venue,
        external_id: String,
        book: OrderBook,
    },
    Quote {
        venue: Venue,
        external_id: String,
        quote: Quote,
    },
    MarketClosed {
        venue: Venue,
        external_id: String,
    },
    Disconnected {
        venue: Venue,
        reason: String,
    },
}

impl IngestionEvent {
    /// Project onto the external push-bus shape; `MarketClosed` and
    /// `Disconnected` have no external representation.
    #[must_use]
    pub fn as_push_event(&self) -> Option<PushEvent> {
        match self {
            Self::OrderBook { venue, external_id, .. } => Some(PushEvent::OrderBook {
                venue: *venue,
                market_id: external_id.clone(),
            }),
            Self::Quote { venue, external_id, quote } => {
                quote.last_price().or(quote.best_bid()).map(|price| PushEvent::Price {
                    venue: *venue,
                    market_id: external_id.clone(),
                    price,
                })
            }
            Self::MarketClosed { .. } | Self::Disconnected { .. } => None,
        }
    }
}

/// Event forwarded to the external push bus collaborator (§6), distinct
/// from `IngestionEvent` so adapters never depend on the API-facing shape.
#[derive(Debug, Clone)]
pub enum PushEvent {
    NewOpportunity {
        id: uuid::Uuid,
        match_source: String,
        match_target: String,
        roi: f64,
        net_profit: f64,
        confidence: f64,
    },
    Price {
        venue: Venue,
        market_id: String,
        price: rust_decimal::Decimal,
    },
    OrderBook {
        venue: Venue,
        market_id: String,
    },
}

/// Snapshot of newly-fetched markets from a full or targeted sync, used
/// internally by the orchestrator to upsert the market registry.
#[derive(Debug, Clone)]
pub struct MarketSyncBatch {
    pub venue: Venue,
    pub markets: Vec<Market>,
    pub latency_ms: u64,
}
