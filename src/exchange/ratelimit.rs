//! Per-venue in-flight cap and inter-request pacing (§4.B).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::Instant;

/// Bounds concurrent outstanding requests to one venue and widens the
/// minimum gap between requests on `RATE_LIMITED` signals, decaying back
/// down after a cool-off.
pub struct VenueGate {
    semaphore: Semaphore,
    base_pacing: Duration,
    pacing_ms: AtomicU64,
    last_request: parking_lot::Mutex<Option<Instant>>,
    cooled_off_until_ms: AtomicU64,
}

impl VenueGate {
    #[must_use]
    pub fn new(max_in_flight: u32, base_pacing: Duration) -> Self {
        Self {
            semaphore: Semaphore::new(max_in_flight as usize),
            base_pacing,
            pacing_ms: AtomicU64::new(base_pacing.as_millis() as u64),
            last_request: parking_lot::Mutex::new(None),
            cooled_off_until_ms: AtomicU64::new(0),
        }
    }

    /// Acquire an in-flight slot, waiting out the current pacing gap first.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.wait_for_pacing().await;
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");
        *self.last_request.lock() = Some(Instant::now());
        permit
    }

    async fn wait_for_pacing(&self) {
        let pacing = Duration::from_millis(self.pacing_ms.load(Ordering::Relaxed));
        let wait = {
            let last = *self.last_request.lock();
            last.map(|t| pacing.saturating_sub(t.elapsed()))
        };
        if let Some(wait) = wait {
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Widen pacing exponentially (doubling, capped at 30s) on a
    /// `RATE_LIMITED` response.
    pub fn on_rate_limited(&self) {
        let current = self.pacing_ms.load(Ordering::Relaxed);
        let widened = (current * 2).clamp(1, 30_000);
        self.pacing_ms.store(widened, Ordering::Relaxed);
    }

    /// Decay pacing back toward the base rate once the cool-off period has
    /// elapsed without another rate-limit signal.
    pub fn decay(&self) {
        let base = self.base_pacing.as_millis() as u64;
        let current = self.pacing_ms.load(Ordering::Relaxed);
        if current > base {
            self.pacing_ms.store((current / 2).max(base), Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms.load(Ordering::Relaxed))
    }
}

/// Shared handle, one per venue, owned by the ingestion orchestrator.
pub type SharedVenueGate = Arc<VenueGate>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_respects_in_flight_cap() {
        let gate = VenueGate::new(1, Duration::from_millis(0));
        let permit = gate.acquire().await;
        assert_eq!(gate.semaphore.available_permits(), 0);
        drop(permit);
        assert_eq!(gate.semaphore.available_permits(), 1);
    }

    #[test]
    fn on_rate_limited_doubles_pacing_up_to_cap() {
        let gate = VenueGate::new(5, Duration::from_millis(100));
        gate.on_rate_limited();
        assert_eq!(gate.pacing(), Duration::from_millis(200));
        for _ in 0..20 {
            gate.on_rate_limited();
        }
        assert_eq!(gate.pacing(), Duration::from_millis(30_000));
    }

    #[test]
    fn decay_halves_pacing_toward_base() {
        let gate = VenueGate::new(5, Duration::from_millis(100));
        gate.on_rate_limited();
        gate.on_rate_limited();
        assert_eq!(gate.pacing(), Duration::from_millis(400));
        gate.decay();
        assert_eq!(gate.pacing(), Duration::from_millis(200));
        gate.decay();
        assert_eq!(gate.pacing(), Duration::from_millis(100));
        gate.decay();
        assert_eq!(gate.pacing(), Duration::from_millis(100));
    }
}
