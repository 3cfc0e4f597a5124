//! Venue adapters: the common contract plus one implementation per venue.

pub mod kalshi;
pub mod normalize;
pub mod polymarket;
pub mod ratelimit;
pub mod traits;

pub use kalshi::KalshiAdapter;
pub use polymarket::PolymarketAdapter;
pub use ratelimit::{SharedVenueGate, VenueGate};
pub use traits::{HealthStatus, VenueAdapter, VenueHealth};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::domain::Venue;

/// One adapter per enabled venue, keyed by `Venue` so callers don't have to
/// match on venue-specific types.
pub struct AdapterRegistry {
    adapters: HashMap<Venue, Arc<dyn VenueAdapter>>,
}

impl AdapterRegistry {
    /// Build the set of adapters enabled by `config`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let mut adapters: HashMap<Venue, Arc<dyn VenueAdapter>> = HashMap::new();

        if config.venues.polymarket.enabled {
            adapters.insert(Venue::Polymarket, Arc::new(PolymarketAdapter::new()));
        }
        if config.venues.kalshi.enabled {
            let gate = Arc::new(VenueGate::new(
                4,
                Duration::from_millis(60_000 / config.venues.kalshi.rate_limit_per_min.max(1)),
            ));
            adapters.insert(Venue::Kalshi, Arc::new(KalshiAdapter::new(gate)));
        }

        Self { adapters }
    }

    /// Build a registry directly from a prebuilt adapter set, used by tests
    /// that inject a scripted `VenueAdapter` instead of a real venue client.
    #[must_use]
    pub fn from_adapters(adapters: HashMap<Venue, Arc<dyn VenueAdapter>>) -> Self {
        Self { adapters }
    }

    #[must_use]
    pub fn get(&self, venue: Venue) -> Option<Arc<dyn VenueAdapter>> {
        self.adapters.get(&venue).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Venue, &Arc<dyn VenueAdapter>)> {
        self.adapters.iter().map(|(v, a)| (*v, a))
    }

    #[must_use]
    pub fn venues(&self) -> Vec<Venue> {
        self.adapters.keys().copied().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
