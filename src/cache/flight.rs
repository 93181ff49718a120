//! Single-flight request coalescing
//!
//! Concurrent callers asking for the same key share one execution of the
//! producer. The producer runs on its own task so a caller that stops
//! waiting does not cancel work other callers (or the caches) depend on.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;

use crate::error::ApiError;

type Outcome<V> = std::result::Result<V, ApiError>;
type SharedOutcome<V> = Shared<BoxFuture<'static, Outcome<V>>>;
type Registry<V> = Arc<Mutex<HashMap<String, SharedOutcome<V>>>>;

/// Deduplicates concurrent operations by key.
pub struct SingleFlight<V> {
    pending: Registry<V>,
}

impl<V> Default for SingleFlight<V> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes the registration for a key when the producer task finishes,
/// whether it returned, failed or panicked.
struct PendingGuard<V> {
    registry: Registry<V>,
    key: String,
}

impl<V> Drop for PendingGuard<V> {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.key);
    }
}

fn lock<V>(registry: &Registry<V>) -> MutexGuard<'_, HashMap<String, SharedOutcome<V>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `producer` for `key`, or join the execution already in flight.
    ///
    /// Every caller joined to one execution gets a clone of the same
    /// outcome. The key is unregistered before that outcome is delivered, so
    /// the next call after settlement starts fresh.
    pub async fn run<F, Fut>(&self, key: &str, producer: F) -> Outcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<V>> + Send + 'static,
    {
        let shared = {
            let mut pending = lock(&self.pending);
            match pending.get(key) {
                Some(existing) => {
                    debug!("Joining in-flight operation: {}", key);
                    existing.clone()
                }
                None => {
                    let guard = PendingGuard {
                        registry: Arc::clone(&self.pending),
                        key: key.to_string(),
                    };
                    let work = producer();
                    let handle = tokio::spawn(async move {
                        let outcome = work.await;
                        drop(guard);
                        outcome
                    });
                    let shared = async move {
                        match handle.await {
                            Ok(outcome) => outcome,
                            Err(err) => Err(ApiError::Internal(format!(
                                "in-flight operation aborted: {}",
                                err
                            ))),
                        }
                    }
                    .boxed()
                    .shared();
                    pending.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Whether an operation is currently registered for `key`.
    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.pending).contains_key(key)
    }

    /// Number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }
}
