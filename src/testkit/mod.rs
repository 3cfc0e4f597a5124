//! Shared test fixtures available to both unit tests (`#[cfg(test)]`) and
//! integration tests (the `testkit` feature).
//!
//! - [`domain`] — concise builders for `Market`/`OrderBook` so tests focus
//!   on assertions rather than construction boilerplate.

pub mod domain;
