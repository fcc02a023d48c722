//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter enforcing a minimum interval between permits.
///
/// Burst size is 1, so two permits can never be closer together than
/// `min_interval`.
pub fn create_interval_limiter(min_interval: Duration) -> Arc<Limiter> {
    let quota = Quota::with_period(min_interval)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(quota))
}

/// Outbound movement throttle (one permit per configured interval)
#[derive(Clone)]
pub struct MovementThrottle {
    limiter: Arc<Limiter>,
}

impl MovementThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            limiter: create_interval_limiter(min_interval),
        }
    }

    /// Check whether a movement update may be sent right now
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
