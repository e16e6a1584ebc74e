use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::admission::errors::AdmissionError;
use crate::domain::admission::models::BucketPolicy;
use crate::domain::admission::models::TokenBucket;

/// Per-client token-bucket rate limiter.
///
/// The table maps a client key to its own bucket behind its own mutex. The
/// request path holds the table's read lock while it updates one bucket, so
/// different keys proceed in parallel and the same key is serialized. Adding
/// a key and purging take the write lock, which keeps a purge from evicting a
/// bucket in the middle of a refill-and-debit.
#[derive(Debug)]
pub struct AdmissionController {
    policy: BucketPolicy,
    buckets: RwLock<HashMap<String, Arc<Mutex<TokenBucket>>>>,
}

impl AdmissionController {
    pub fn new(policy: BucketPolicy) -> Self {
        Self {
            policy,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &BucketPolicy {
        &self.policy
    }

    /// Admit or reject one request from `client_key`.
    ///
    /// # Errors
    /// * `RateLimited` - The client's bucket holds less than one token
    pub async fn admit(&self, client_key: &str) -> Result<(), AdmissionError> {
        let outcome = {
            let buckets = self.buckets.read().await;
            match buckets.get(client_key) {
                Some(bucket) => Some(bucket.lock().await.try_acquire(&self.policy, Instant::now())),
                None => None,
            }
        };

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => {
                let mut buckets = self.buckets.write().await;
                let bucket = buckets
                    .entry(client_key.to_string())
                    .or_insert_with(|| {
                        tracing::debug!(client = %client_key, "Tracking new client");
                        Arc::new(Mutex::new(TokenBucket::new(&self.policy, Instant::now())))
                    });
                let outcome = bucket.lock().await.try_acquire(&self.policy, Instant::now());
                outcome
            }
        };

        outcome.map_err(|retry_after| {
            tracing::warn!(
                client = %client_key,
                retry_after_ms = retry_after.as_millis(),
                "Rate limit exceeded"
            );
            AdmissionError::RateLimited { retry_after }
        })
    }

    /// Evict buckets that have not been used within the idle timeout.
    ///
    /// Candidates are gathered under the read lock, so admissions keep
    /// flowing during the scan. The write lock is held only for removal, and
    /// a candidate touched in between is kept.
    ///
    /// # Returns
    /// Number of evicted buckets
    pub async fn purge_idle(&self) -> usize {
        let candidates: Vec<String> = {
            let buckets = self.buckets.read().await;
            let now = Instant::now();
            let mut idle = Vec::new();
            for (key, bucket) in buckets.iter() {
                if bucket.lock().await.is_idle(&self.policy, now) {
                    idle.push(key.clone());
                }
            }
            idle
        };

        if candidates.is_empty() {
            return 0;
        }

        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        let mut evicted = 0;
        for key in &candidates {
            let still_idle = buckets
                .get(key)
                .and_then(|bucket| bucket.try_lock().ok().map(|b| b.is_idle(&self.policy, now)))
                .unwrap_or(false);
            if still_idle {
                buckets.remove(key);
                evicted += 1;
            }
        }

        tracing::debug!(
            evicted,
            remaining = buckets.len(),
            "Purged idle rate-limit buckets"
        );
        evicted
    }

    /// Number of client keys currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }

    /// Spawn the background sweep that calls [`Self::purge_idle`] every `period`.
    ///
    /// The task runs until aborted or until the runtime shuts down.
    pub fn spawn_purge_task(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                controller.purge_idle().await;
            }
        })
    }
}
