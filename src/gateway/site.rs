//! Site name to id resolution

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;

use crate::cache::{CacheTtl, SingleFlight, TtlCache, site_key};
use crate::client::models::{SiteSummary, data_items};
use crate::client::{AuthMode, AuthedClient};
use crate::error::ApiResult;

/// Integration API site listing
pub const INTEGRATION_SITES_PATH: &str = "/proxy/network/integration/v1/sites";

/// Session API site listing, before the platform prefix
const SELF_SITES_PATH: &str = "/api/self/sites";

/// Minimum length of a value taken to already be a site id
const MIN_ID_LEN: usize = 24;

/// Whether a value already looks like an opaque site id.
pub fn looks_like_id(value: &str) -> bool {
    value.contains('-') && value.len() >= MIN_ID_LEN
}

/// Path that lists sites for a client's auth mode
pub fn sites_path(client: &AuthedClient) -> String {
    match client.auth_mode() {
        AuthMode::ApiKey => INTEGRATION_SITES_PATH.to_string(),
        AuthMode::Session => client.network_path(SELF_SITES_PATH),
    }
}

/// Pick the site matching `requested`.
///
/// Display name first, then internal name, case-insensitively; otherwise the
/// only site, otherwise the first one.
pub fn pick_site(sites: &[SiteSummary], requested: &str) -> Option<String> {
    sites
        .iter()
        .find(|s| s.display_name.eq_ignore_ascii_case(requested))
        .or_else(|| sites.iter().find(|s| s.id.eq_ignore_ascii_case(requested)))
        .or_else(|| sites.first())
        .map(|s| s.id.clone())
}

pub struct SiteResolver {
    ids: Arc<TtlCache<String>>,
    lookups: SingleFlight<String>,
    ttl: Duration,
}

impl Default for SiteResolver {
    fn default() -> Self {
        Self {
            ids: Arc::new(TtlCache::new()),
            lookups: SingleFlight::new(),
            ttl: CacheTtl::SITE_ID,
        }
    }
}

impl SiteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a site name (or id) to the id used in request paths.
    ///
    /// Never fails: if the site list cannot be fetched the input is used
    /// as-is and nothing is cached.
    pub async fn resolve(&self, client: &AuthedClient, requested: &str) -> String {
        if looks_like_id(requested) {
            return requested.to_string();
        }

        let key = site_key(client.auth_mode().as_str(), client.base_url(), requested);
        if let Some(id) = self.ids.get(&key) {
            debug!("Site id cache hit: {}", key);
            return id;
        }

        let ids = Arc::clone(&self.ids);
        let ttl = self.ttl;
        let client = client.clone();
        let name = requested.to_string();
        let cache_key = key.clone();
        let resolved = self
            .lookups
            .run(&key, move || async move {
                let listing = client.get_json(&sites_path(&client)).await?;
                let sites = parse_sites(&listing)?;
                let id = pick_site(&sites, &name).unwrap_or(name);
                ids.set(cache_key, id.clone(), ttl);
                Ok(id)
            })
            .await;

        match resolved {
            Ok(id) => id,
            Err(e) => {
                warn!("Could not list sites ({}); using '{}' as the site id", e, requested);
                requested.to_string()
            }
        }
    }

    pub fn ids(&self) -> &TtlCache<String> {
        &self.ids
    }
}

fn parse_sites(listing: &Value) -> ApiResult<Vec<SiteSummary>> {
    Ok(data_items(listing)?
        .iter()
        .filter_map(SiteSummary::from_value)
        .collect())
}
