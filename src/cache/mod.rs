//! In-memory caching primitives
//!
//! Generic building blocks shared by the session, site and endpoint layers:
//! a TTL map, a single-flight coordinator and a failure backoff tracker.
//! Nothing here touches disk; all state lives as long as the process.

pub mod backoff;
pub mod flight;
pub mod key;
pub mod ttl;

use std::time::Duration;

/// Cache TTL configuration per data type
pub struct CacheTtl;

impl CacheTtl {
    // Sessions - renewed ahead of the controller's own ~30 min expiry
    pub const SESSION: Duration = Duration::from_secs(25 * 60); // 25 min

    // Site name -> id lookups rarely change
    pub const SITE_ID: Duration = Duration::from_secs(5 * 60); // 5 min

    // Endpoint payloads - spans one burst of widget polls
    pub const ENDPOINT: Duration = Duration::from_secs(45); // 45 sec

    // Login failure cool-down
    pub const BACKOFF_BASE: Duration = Duration::from_secs(10 * 60); // 10 min
    pub const BACKOFF_MAX: Duration = Duration::from_secs(30 * 60); // 30 min
}

// Re-export main types
pub use backoff::{BackoffTracker, Blocked, FailureRecord};
pub use flight::SingleFlight;
pub use key::{endpoint_key, session_key, site_key};
pub use ttl::TtlCache;
