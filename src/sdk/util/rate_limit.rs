use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

pub type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Shared limiter for the public OSM services (Nominatim asks for at most one request per second).
pub fn requests_per_second(rate: NonZeroU32) -> Limiter {
    Arc::new(RateLimiter::direct(Quota::per_second(rate)))
}

pub fn osm_limiter() -> Limiter {
    requests_per_second(NonZeroU32::MIN)
}
