//! Per-host request pacing
//!
//! Reactive, like the controller's own limiter: pacing for a host only
//! switches on after that host answers a data request with 429. Until then
//! requests flow unthrottled.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use tokio::sync::RwLock;

/// Requests per second allowed to a host once pacing is active
pub const PACED_REQUESTS_PER_SECOND: u32 = 2;

/// Rate limiter state for a single host.
pub struct HostRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
    host: String,
}

impl HostRateLimiter {
    pub fn new(host: &str, per_second: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: RateLimiter::direct(quota),
            active: AtomicBool::new(false),
            host: host.to_string(),
        }
    }

    /// Activate pacing for this host.
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!("Request pacing activated for {}", self.host);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if pacing is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            self.limiter.until_ready().await;
        }
    }
}

/// Pacing state for every host seen so far.
pub struct HostPacer {
    per_second: u32,
    limiters: RwLock<HashMap<String, Arc<HostRateLimiter>>>,
}

impl Default for HostPacer {
    fn default() -> Self {
        Self::new(PACED_REQUESTS_PER_SECOND)
    }
}

impl HostPacer {
    pub fn new(per_second: u32) -> Self {
        Self {
            per_second,
            limiters: RwLock::new(HashMap::new()),
        }
    }

    /// Wait for a permit for `host` (no-op unless pacing was activated).
    pub async fn wait_for(&self, host: &str) {
        let limiter = self.limiters.read().await.get(host).cloned();
        if let Some(limiter) = limiter {
            limiter.wait_if_active().await;
        }
    }

    /// Activate pacing for `host` (called on 429).
    pub async fn activate(&self, host: &str) {
        let mut limiters = self.limiters.write().await;
        limiters
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(HostRateLimiter::new(host, self.per_second)))
            .activate();
    }

    pub async fn is_active(&self, host: &str) -> bool {
        self.limiters
            .read()
            .await
            .get(host)
            .is_some_and(|l| l.is_active())
    }
}

/// Host part (`host[:port]`) of a URL.
pub fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}
