//! In-memory `external_id -> (yes_token, no_token)` map.
//!
//! Polymarket's REST/WS APIs address order books by token id, not by the
//! market's `condition_id`; this registry is populated on every market
//! sync so book fetches can resolve the right token.

use std::collections::HashMap;

use parking_lot::RwLock;

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub yes: String,
    pub no: String,
}

#[derive(Default)]
pub struct TokenRegistry {
    inner: RwLock<HashMap<String, TokenPair>>,
}

impl TokenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, external_id: String, yes: String, no: String) {
        self.inner.write().insert(external_id, TokenPair { yes, no });
    }

    #[must_use]
    pub fn get(&self, external_id: &str) -> Option<TokenPair> {
        self.inner.read().get(external_id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let registry = TokenRegistry::new();
        registry.insert("m1".into(), "yes-tok".into(), "no-tok".into());
        let pair = registry.get("m1").unwrap();
        assert_eq!(pair.yes, "yes-tok");
        assert_eq!(pair.no, "no-tok");
    }

    #[test]
    fn get_missing_returns_none() {
        let registry = TokenRegistry::new();
        assert!(registry.get("missing").is_none());
    }
}
