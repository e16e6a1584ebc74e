use std::time::Duration;

use tokio::time::Instant;

/// Refill rate, capacity and idle horizon shared by every bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketPolicy {
    /// Tokens added per second
    pub rate: f64,
    /// Maximum tokens a bucket can hold
    pub burst: f64,
    /// Buckets not touched for this long are evicted by a purge
    pub idle_timeout: Duration,
}

impl BucketPolicy {
    pub fn new(rate: f64, burst: f64, idle_timeout: Duration) -> Self {
        Self {
            rate,
            burst,
            idle_timeout,
        }
    }
}

/// Per-client token bucket.
///
/// Refill is lazy: elapsed time since the last refill is converted into
/// tokens on each access. Tokens stay within `[0, burst]`.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    /// A new bucket starts full.
    pub fn new(policy: &BucketPolicy, now: Instant) -> Self {
        Self {
            tokens: policy.burst,
            last_refill: now,
            last_seen: now,
        }
    }

    /// Refill, then take one token if available.
    ///
    /// On rejection nothing is debited and the time until one token will be
    /// available is returned.
    pub fn try_acquire(&mut self, policy: &BucketPolicy, now: Instant) -> Result<(), Duration> {
        self.refill(policy, now);
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(missing / policy.rate))
        }
    }

    fn refill(&mut self, policy: &BucketPolicy, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * policy.rate).min(policy.burst);
        self.last_refill = now;
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Whether the bucket has gone unused for at least the idle timeout.
    pub fn is_idle(&self, policy: &BucketPolicy, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) >= policy.idle_timeout
    }
}
