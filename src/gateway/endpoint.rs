//! Endpoint response cache
//!
//! Payloads are keyed by method, base URL and path with query, so callers
//! that need the same resource share one upstream request and one cached
//! result. Failures are never stored.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::Method;
use serde_json::Value;

use crate::cache::{CacheTtl, SingleFlight, TtlCache, endpoint_key};
use crate::client::AuthedClient;
use crate::error::ApiResult;

pub struct EndpointCache {
    entries: Arc<TtlCache<Value>>,
    flights: SingleFlight<Value>,
    ttl: Duration,
}

impl Default for EndpointCache {
    fn default() -> Self {
        Self::new(CacheTtl::ENDPOINT)
    }
}

impl EndpointCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(TtlCache::new()),
            flights: SingleFlight::new(),
            ttl,
        }
    }

    /// Cached value for `key`, or the (deduplicated) result of `producer`.
    pub async fn fetch_cached<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> ApiResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Value>> + Send + 'static,
    {
        if let Some(value) = self.entries.get(key) {
            debug!("Endpoint cache hit: {}", key);
            return Ok(value);
        }

        let entries = Arc::clone(&self.entries);
        let cache_key = key.to_string();
        self.flights
            .run(key, move || {
                let work = producer();
                async move {
                    let value = work.await?;
                    entries.set(cache_key, value.clone(), ttl);
                    Ok(value)
                }
            })
            .await
    }

    /// GET a path through the cache with the default TTL.
    pub async fn get_json(&self, client: &AuthedClient, path: &str) -> ApiResult<Value> {
        let key = endpoint_key(&Method::GET, client.base_url(), path);
        let client = client.clone();
        let path = path.to_string();
        self.fetch_cached(&key, self.ttl, move || async move { client.get_json(&path).await })
            .await
    }

    pub fn entries(&self) -> &TtlCache<Value> {
        &self.entries
    }
}
