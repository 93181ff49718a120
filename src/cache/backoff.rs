//! Failed-attempt backoff tracking
//!
//! The controller's login limiter restarts its window on every attempt, so
//! retrying on a short timer keeps it tripped indefinitely. After a failure
//! the key is blocked for a cool-down that doubles with each consecutive
//! failure, capped at [`CacheTtl::BACKOFF_MAX`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::warn;
use tokio::time::Instant;

use crate::cache::CacheTtl;
use crate::error::ApiError;

/// The latest failure recorded for a key.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub last_error: ApiError,
    pub cooldown_until: Instant,
    pub cooldown: Duration,
    pub retry_count: u32,
}

/// Returned by [`BackoffTracker::should_block`] while a cool-down is active.
#[derive(Debug, Clone)]
pub struct Blocked {
    pub remaining: Duration,
    pub retry_count: u32,
    pub last_error: ApiError,
}

/// Per-key failure records with exponential cool-down.
pub struct BackoffTracker {
    base: Duration,
    max: Duration,
    records: Mutex<HashMap<String, FailureRecord>>,
}

impl Default for BackoffTracker {
    fn default() -> Self {
        Self::new(CacheTtl::BACKOFF_BASE, CacheTtl::BACKOFF_MAX)
    }
}

/// Cool-down for the n-th consecutive failure (1-based): base * 2^(n-1), capped.
pub fn cooldown_for(retry_count: u32, base: Duration, max: Duration) -> Duration {
    let exponent = retry_count.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent).min(max)
}

impl BackoffTracker {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            records: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, FailureRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A record whose cool-down lapsed longer ago than the max window no
    /// longer counts towards the retry streak.
    fn is_stale(&self, record: &FailureRecord, now: Instant) -> bool {
        now >= record.cooldown_until + self.max
    }

    /// Remaining cool-down for `key`, if an attempt should be suppressed.
    pub fn should_block(&self, key: &str) -> Option<Blocked> {
        let now = Instant::now();
        let mut records = self.lock();
        let record = records.get(key)?;

        if now < record.cooldown_until {
            return Some(Blocked {
                remaining: record.cooldown_until - now,
                retry_count: record.retry_count,
                last_error: record.last_error.clone(),
            });
        }
        if self.is_stale(record, now) {
            records.remove(key);
        }
        None
    }

    /// Record a failure, replacing any previous record for the key.
    pub fn record_failure(&self, key: &str, error: ApiError) -> FailureRecord {
        let now = Instant::now();
        let mut records = self.lock();

        let retry_count = match records.get(key) {
            Some(previous) if !self.is_stale(previous, now) => previous.retry_count + 1,
            _ => 1,
        };
        let cooldown = cooldown_for(retry_count, self.base, self.max);
        let record = FailureRecord {
            last_error: error,
            cooldown_until: now + cooldown,
            cooldown,
            retry_count,
        };

        warn!(
            "Failure #{} for {}; suppressing attempts for {:?}",
            retry_count, key, cooldown
        );
        records.insert(key.to_string(), record.clone());
        record
    }

    /// Forget the record for a key. Returns whether one existed.
    pub fn clear(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn delete_matching<P>(&self, predicate: P) -> usize
    where
        P: Fn(&str) -> bool,
    {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|key, _| !predicate(key));
        before - records.len()
    }

    pub fn clear_all(&self) -> usize {
        let mut records = self.lock();
        let count = records.len();
        records.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Current record for a key, stale or not.
    pub fn record(&self, key: &str) -> Option<FailureRecord> {
        self.lock().get(key).cloned()
    }

    /// Keys with an active cool-down and the time left on each.
    pub fn active(&self) -> Vec<(String, Duration, u32)> {
        let now = Instant::now();
        let mut active: Vec<_> = self
            .lock()
            .iter()
            .filter(|(_, r)| now < r.cooldown_until)
            .map(|(k, r)| (k.clone(), r.cooldown_until - now, r.retry_count))
            .collect();
        active.sort();
        active
    }
}
