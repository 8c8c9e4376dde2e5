//! Token-bucket admission control shared across requests.
//!
//! # Algorithm
//!
//! Backed by the Governor crate's direct (unkeyed) limiter, a Generic Cell
//! Rate Algorithm that behaves as a token bucket: a bucket of `capacity`
//! permits refills at `rate` permits per second, capped at capacity. Each
//! `allow()` call attempts to consume exactly one permit.
//!
//! # Concurrency
//!
//! The bucket is the only piece of shared mutable state in the request path.
//! Governor updates it with a single atomic compare-and-swap, so `allow()`
//! takes `&self` and is safe under concurrent callers without an outer lock.
//!
//! # Scope
//!
//! One bucket per limiter instance — global admission control, not
//! per-client. The limiter is constructed once at startup and injected into
//! whichever handlers need it; it is not a process-wide singleton.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorLimiter};

/// Error type for limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterError {
    /// Refill rate cannot be zero.
    ZeroRate,
    /// Bucket capacity cannot be zero.
    ZeroCapacity,
}

impl fmt::Display for LimiterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimiterError::ZeroRate => write!(f, "refill rate must be greater than 0"),
            LimiterError::ZeroCapacity => write!(f, "bucket capacity must be greater than 0"),
        }
    }
}

impl std::error::Error for LimiterError {}

type DirectLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Global token-bucket rate limiter.
///
/// Cheap to clone; clones share the same bucket.
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DirectLimiter>,
    capacity: u32,
    rate: u32,
}

impl RateLimiter {
    /// Create a limiter with the given bucket capacity and refill rate
    /// (permits per second).
    ///
    /// # Errors
    ///
    /// Returns `LimiterError` if either value is zero.
    pub fn new(capacity: u32, rate: u32) -> Result<Self, LimiterError> {
        let rate = NonZeroU32::new(rate).ok_or(LimiterError::ZeroRate)?;
        let capacity_nz = NonZeroU32::new(capacity).ok_or(LimiterError::ZeroCapacity)?;

        let quota = Quota::per_second(rate).allow_burst(capacity_nz);

        Ok(Self {
            bucket: Arc::new(GovernorLimiter::direct(quota)),
            capacity,
            rate: rate.get(),
        })
    }

    /// Attempt to consume one permit.
    ///
    /// Returns `true` if a permit was available and consumed, `false` if the
    /// bucket is empty. Rejection is immediate — there is no queuing or
    /// retry; the caller is expected to answer with a too-many-requests
    /// signal.
    pub fn allow(&self) -> bool {
        self.bucket.check().is_ok()
    }

    /// Configured bucket capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Configured refill rate in permits per second.
    pub fn rate(&self) -> u32 {
        self.rate
    }
}
