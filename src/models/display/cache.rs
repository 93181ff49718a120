//! Cache state display model

use serde::Serialize;
use tabled::Tabled;

use super::common::format_remaining;
use crate::gateway::CacheStats;

/// One live cache entry or active cool-down
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct CacheEntryDisplay {
    #[tabled(rename = "CACHE")]
    pub cache: String,

    #[tabled(rename = "KEY")]
    pub key: String,

    #[tabled(rename = "EXPIRES IN")]
    pub expires_in: String,
}

impl CacheEntryDisplay {
    pub fn rows(stats: &CacheStats) -> Vec<Self> {
        let entries = |cache: &str, entries: &[(String, std::time::Duration)]| {
            entries
                .iter()
                .map(|(key, remaining)| Self {
                    cache: cache.to_string(),
                    key: key.clone(),
                    expires_in: format_remaining(*remaining),
                })
                .collect::<Vec<_>>()
        };

        let mut rows = entries("session", &stats.sessions);
        rows.extend(entries("site", &stats.site_ids));
        rows.extend(entries("endpoint", &stats.endpoints));
        rows.extend(stats.backoff.iter().map(|(key, remaining, retries)| Self {
            cache: format!("backoff (#{})", retries),
            key: key.clone(),
            expires_in: format_remaining(*remaining),
        }));
        rows
    }
}
