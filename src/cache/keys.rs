//! Cache key schema (§6): stable string keys for the generic response cache.

use crate::domain::Venue;

#[must_use]
pub fn order_book_key(venue: Venue, external_id: &str) -> String {
    format!("orderbook:{}:{external_id}", venue.tag())
}

#[must_use]
pub fn quote_key(venue: Venue, external_id: &str) -> String {
    format!("quote:{}:{external_id}", venue.tag())
}

#[must_use]
pub fn response_key(app_prefix: &str, arbitrary_key: &str) -> String {
    format!("{app_prefix}:{arbitrary_key}")
}
