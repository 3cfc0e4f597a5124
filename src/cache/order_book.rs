//! Order book cache: the detector's only authoritative "latest book".

use std::time::Duration;

use tokio::sync::broadcast;

use crate::domain::{MarketId, OrderBook};

use super::ttl::TtlCache;

/// Per §4.C: a 10-second TTL on every order book entry.
pub const ORDER_BOOK_TTL: Duration = Duration::from_secs(10);

/// Notification sent when an order book is updated.
#[derive(Debug, Clone)]
pub struct OrderBookUpdate {
    pub market_id: MarketId,
}

/// Thread-safe, short-TTL cache of order books with optional broadcast
/// notifications, keyed by `(venue, external_id)`.
pub struct OrderBookCache {
    books: TtlCache<MarketId, OrderBook>,
    tx: Option<broadcast::Sender<OrderBookUpdate>>,
}

impl OrderBookCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            books: TtlCache::new(ORDER_BOOK_TTL),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_notifications(capacity: usize) -> (Self, broadcast::Receiver<OrderBookUpdate>) {
        let (tx, rx) = broadcast::channel(capacity);
        let cache = Self {
            books: TtlCache::new(ORDER_BOOK_TTL),
            tx: Some(tx),
        };
        (cache, rx)
    }

    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<OrderBookUpdate>> {
        self.tx.as_ref().map(|tx| tx.subscribe())
    }

    /// Write-through from the ingestion orchestrator. Fire-and-forget:
    /// notification send errors (no receivers) are ignored.
    pub fn update(&self, book: OrderBook) {
        let market_id = book.market_id().clone();
        self.books.insert(market_id.clone(), book);
        if let Some(ref tx) = self.tx {
            let _ = tx.send(OrderBookUpdate { market_id });
        }
    }

    #[must_use]
    pub fn get(&self, market_id: &MarketId) -> Option<OrderBook> {
        self.books.get(market_id)
    }

    /// Fetch both legs of a pair atomically with respect to the cache
    /// (though not with respect to each other's ingestion timestamp — the
    /// detector's contract allows "at this instant, two books looked like
    /// this", not a cross-pair snapshot).
    #[must_use]
    pub fn get_pair(
        &self,
        source: &MarketId,
        target: &MarketId,
    ) -> (Option<OrderBook>, Option<OrderBook>) {
        (self.books.get(source), self.books.get(target))
    }

    pub fn sweep_expired(&self) {
        self.books.sweep_expired();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl Default for OrderBookCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PriceLevel, Venue};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn book(id: MarketId) -> OrderBook {
        OrderBook::with_levels(
            id,
            vec![PriceLevel::new(dec!(0.45), dec!(100))],
            vec![PriceLevel::new(dec!(0.50), dec!(100))],
            Utc::now(),
            20,
        )
    }

    #[test]
    fn update_and_get_round_trips() {
        let cache = OrderBookCache::new();
        let id = MarketId::new(Venue::Polymarket, "m1");
        cache.update(book(id.clone()));

        let retrieved = cache.get(&id).unwrap();
        assert_eq!(retrieved.best_bid().unwrap().price(), dec!(0.45));
    }

    #[test]
    fn get_pair_returns_both_legs() {
        let cache = OrderBookCache::new();
        let a = MarketId::new(Venue::Polymarket, "a");
        let b = MarketId::new(Venue::Kalshi, "b");
        cache.update(book(a.clone()));
        cache.update(book(b.clone()));

        let (got_a, got_b) = cache.get_pair(&a, &b);
        assert!(got_a.is_some());
        assert!(got_b.is_some());
    }

    #[tokio::test]
    async fn notifies_subscribers_on_update() {
        let (cache, mut rx) = OrderBookCache::with_notifications(16);
        let id = MarketId::new(Venue::Polymarket, "m1");
        cache.update(book(id.clone()));

        let update = rx.recv().await.unwrap();
        assert_eq!(update.market_id, id);
    }

    #[test]
    fn subscribe_none_without_notifications() {
        let cache = OrderBookCache::new();
        assert!(cache.subscribe().is_none());
    }
}
