//! Shared venue-agnostic normalization helpers (§4.A).

use rust_decimal::Decimal;

use crate::domain::{OrderBook, PriceLevel};

/// Convert a cent-denominated price (0-100) to the common `[0,1]` scale.
#[must_use]
pub fn cents_to_fraction(cents: Decimal) -> Decimal {
    cents / Decimal::from(100)
}

/// Reconstruct the complement side of a strictly binary market as
/// `1 - price`. Callers should prefer an explicit fetch of the opposite
/// side when the venue publishes one; this is the documented fallback.
#[must_use]
pub fn complement(price: Decimal) -> Decimal {
    Decimal::ONE - price
}

/// Derive the NO-side book from a YES-side book: bids become asks and vice
/// versa, each price complemented, the result marked `synthetic`.
#[must_use]
pub fn complement_book(yes_book: &OrderBook) -> OrderBook {
    let no_bids: Vec<PriceLevel> = yes_book
        .asks()
        .iter()
        .map(|l| PriceLevel::new(complement(l.price()), l.size()))
        .collect();
    let no_asks: Vec<PriceLevel> = yes_book
        .bids()
        .iter()
        .map(|l| PriceLevel::new(complement(l.price()), l.size()))
        .collect();
    let mut book = OrderBook::with_levels(
        yes_book.market_id().clone(),
        no_bids,
        no_asks,
        yes_book.timestamp(),
        yes_book.latency_ms(),
    );
    book.mark_synthetic();
    book
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cents_to_fraction_scales_by_100() {
        assert_eq!(cents_to_fraction(dec!(45)), dec!(0.45));
    }

    #[test]
    fn complement_subtracts_from_one() {
        assert_eq!(complement(dec!(0.40)), dec!(0.60));
    }

    #[test]
    fn complement_book_swaps_and_flips_sides() {
        use crate::domain::{MarketId, Venue};
        use chrono::Utc;

        let yes = crate::domain::OrderBook::with_levels(
            MarketId::new(Venue::Polymarket, "m"),
            vec![PriceLevel::new(dec!(0.40), dec!(100))],
            vec![PriceLevel::new(dec!(0.45), dec!(50))],
            Utc::now(),
            10,
        );
        let no = complement_book(&yes);
        assert!(no.is_synthetic());
        assert_eq!(no.best_bid().unwrap().price(), dec!(0.55));
        assert_eq!(no.best_ask().unwrap().price(), dec!(0.60));
    }
}
