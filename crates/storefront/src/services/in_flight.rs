//! Per-form submission registry.
//!
//! A coupon form instance may have at most one validation in flight. Claims
//! live in a `moka` cache whose TTL matches the outbound request timeout, so
//! a claim whose handler was dropped mid-request (client went away) expires
//! on its own even if the guard's release task never runs.

use std::time::Duration;

use moka::future::Cache;

/// Upper bound on concurrently tracked form instances.
const MAX_CLAIMS: u64 = 100_000;

/// Registry of form instances with a submission in progress.
#[derive(Clone)]
pub struct InFlightRegistry {
    claims: Cache<String, ()>,
}

impl InFlightRegistry {
    /// Create a registry whose claims expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            claims: Cache::builder()
                .max_capacity(MAX_CLAIMS)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Claim `key`, or return `None` if it is already claimed.
    ///
    /// The check and insert are a single atomic cache operation.
    pub async fn claim(&self, key: &str) -> Option<InFlightGuard> {
        let entry = self.claims.entry(key.to_owned()).or_insert(()).await;
        entry.is_fresh().then(|| InFlightGuard {
            claims: self.claims.clone(),
            key: Some(key.to_owned()),
        })
    }

    /// Whether `key` is currently claimed.
    pub async fn is_claimed(&self, key: &str) -> bool {
        self.claims.get(key).await.is_some()
    }
}

/// Holds a claim until released or dropped.
pub struct InFlightGuard {
    claims: Cache<String, ()>,
    key: Option<String>,
}

impl InFlightGuard {
    /// Release the claim now.
    pub async fn release(mut self) {
        if let Some(key) = self.key.take() {
            self.claims.invalidate(&key).await;
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // Dropped without `release` (e.g. the handler future was cancelled).
        let Some(key) = self.key.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let claims = self.claims.clone();
            handle.spawn(async move {
                claims.invalidate(&key).await;
            });
        }
    }
}
