//! Controller gateway
//!
//! The single owner of every cache in the process: sessions, login
//! backoff, site ids and endpoint payloads. Callers share one [`Gateway`]
//! behind an `Arc` and go through [`Gateway::test_connection`],
//! [`Gateway::get_data`] and [`Gateway::clear_caches`].

pub mod endpoint;
pub mod metrics;
pub mod site;

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::Serialize;
use serde_json::json;

use crate::client::models::data_items;
use crate::client::{AuthedClient, HttpTransport, Transport};
use crate::config::ControllerConfig;
use crate::error::ApiResult;
use crate::session::SessionManager;

pub use endpoint::EndpointCache;
pub use metrics::{Metric, MetricData};
pub use site::SiteResolver;

/// Outcome of a connection test. Failures are reported, never raised.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// One metric's data for one controller
#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    pub metric: Metric,
    pub site: String,
    pub data: MetricData,
    /// Set when the data is empty because the metric could not be fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearReport {
    pub cleared_count: usize,
    pub message: String,
}

/// Live cache contents, for operators
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub sessions: Vec<(String, Duration)>,
    pub site_ids: Vec<(String, Duration)>,
    pub endpoints: Vec<(String, Duration)>,
    /// Key, remaining cool-down and consecutive failures
    pub backoff: Vec<(String, Duration, u32)>,
}

pub struct Gateway {
    sessions: SessionManager,
    sites: SiteResolver,
    endpoints: EndpointCache,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(
            SessionManager::new(transport),
            SiteResolver::new(),
            EndpointCache::default(),
        )
    }

    /// Gateway over a real HTTP transport
    pub fn connect() -> ApiResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new()?)))
    }

    pub fn with_parts(
        sessions: SessionManager,
        sites: SiteResolver,
        endpoints: EndpointCache,
    ) -> Self {
        Self {
            sessions,
            sites,
            endpoints,
        }
    }

    pub async fn authenticate(&self, config: &ControllerConfig) -> ApiResult<AuthedClient> {
        self.sessions.authenticate(config).await
    }

    /// Authenticate and list sites once, reporting the outcome.
    pub async fn test_connection(&self, config: &ControllerConfig) -> ConnectionReport {
        match self.probe(config).await {
            Ok(details) => ConnectionReport {
                success: true,
                message: format!("Connected to {}", config.host_label()),
                details,
            },
            Err(e) => {
                warn!("Connection test for {} failed: {}", config.host_label(), e);
                ConnectionReport {
                    success: false,
                    message: e.to_string(),
                    details: serde_json::Value::Null,
                }
            }
        }
    }

    async fn probe(&self, config: &ControllerConfig) -> ApiResult<serde_json::Value> {
        let client = self.authenticate(config).await?;
        let listing = client.get_json(&site::sites_path(&client)).await?;
        let sites = data_items(&listing)?.len();

        Ok(json!({
            "host": config.host_label(),
            "base_url": client.base_url(),
            "auth_mode": client.auth_mode(),
            "platform": client.platform(),
            "sites": sites,
        }))
    }

    /// Fetch one metric for a controller's configured site.
    ///
    /// Unknown metrics and login failures are errors. Once authenticated,
    /// a failed fetch degrades to empty data with a message.
    pub async fn get_data(
        &self,
        config: &ControllerConfig,
        metric: &str,
    ) -> ApiResult<MetricReport> {
        let metric: Metric = metric.parse()?;
        let client = self.authenticate(config).await?;
        let site = self.sites.resolve(&client, &config.site).await;

        let (data, message) = match metrics::fetch(&self.endpoints, &client, &site, metric).await {
            Ok(Some(data)) => (data, None),
            Ok(None) => (
                MetricData::empty(metric),
                Some(format!("{} is not available with API-key access", metric)),
            ),
            Err(e) => {
                warn!("Fetching {} from {} failed: {}", metric, config.host_label(), e);
                (MetricData::empty(metric), Some(metrics::degraded_message(metric, &e)))
            }
        };

        Ok(MetricReport {
            metric,
            site,
            data,
            message,
        })
    }

    /// Drop cached state whose key contains `host_filter` (case-insensitive),
    /// or everything when no filter is given.
    pub fn clear_caches(&self, host_filter: Option<&str>) -> ClearReport {
        let filter = host_filter
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty());

        let (cleared_count, message) = match filter {
            Some(needle) => {
                let matches = |key: &str| key.to_ascii_lowercase().contains(&needle);
                let count = self.sessions.sessions().delete_matching(matches)
                    + self.sessions.backoff().delete_matching(matches)
                    + self.sites.ids().delete_matching(matches)
                    + self.endpoints.entries().delete_matching(matches);
                (count, format!("Cleared {} cached entries for {}", count, needle))
            }
            None => {
                let count = self.sessions.sessions().clear()
                    + self.sessions.backoff().clear_all()
                    + self.sites.ids().clear()
                    + self.endpoints.entries().clear();
                (count, format!("Cleared {} cached entries", count))
            }
        };

        info!("{}", message);
        ClearReport {
            cleared_count,
            message,
        }
    }

    /// Lift the login cool-down for a controller. Returns whether one was set.
    pub fn retry_now(&self, config: &ControllerConfig) -> bool {
        let cleared = self.sessions.retry_now(&SessionManager::key_for(config));
        if cleared {
            info!("Login cool-down for {} lifted", config.host_label());
        }
        cleared
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            sessions: self.sessions.sessions().live_entries(),
            site_ids: self.sites.ids().live_entries(),
            endpoints: self.endpoints.entries().live_entries(),
            backoff: self.sessions.backoff().active(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTransport;
    use crate::client::mock::response;
    use crate::error::ApiError;
    use reqwest::Method;

    const SITES: &str = r#"{"meta":{"rc":"ok"},"data":[{"name":"default","desc":"Default"}]}"#;
    const DEVICES: &str = r#"{"meta":{"rc":"ok"},"data":[
        {"mac":"aa:00","name":"Gateway","type":"ugw","state":1},
        {"mac":"aa:01","name":"Switch","type":"usw","state":1,"uplink":{"uplink_mac":"aa:00"}}
    ]}"#;

    fn scripted() -> Arc<MockTransport> {
        let mock = Arc::new(MockTransport::new());
        mock.on_response(
            Method::POST,
            "/api/login",
            response(200, r#"{"meta":{"rc":"ok"}}"#, &[("set-cookie", "unifises=s1")]),
        );
        mock.on_get("/api/self/sites", 200, SITES);
        mock.on_get("/api/s/default/stat/device", 200, DEVICES);
        mock.on_get("/api/s/default/stat/sta", 200, r#"{"data":[{"mac":"cc:01","hostname":"laptop"}]}"#);
        mock
    }

    fn gateway(mock: &Arc<MockTransport>) -> Gateway {
        Gateway::new(Arc::clone(mock) as Arc<dyn Transport>)
    }

    fn config(host: &str) -> ControllerConfig {
        ControllerConfig::new(host).with_login("admin", "pw")
    }

    #[tokio::test]
    async fn test_devices_and_topology_share_one_fetch() {
        let mock = scripted();
        let gateway = gateway(&mock);
        let cfg = config("h1");

        let (devices, topology) = tokio::join!(
            gateway.get_data(&cfg, "devices"),
            gateway.get_data(&cfg, "topology")
        );
        let devices = devices.unwrap();
        let topology = topology.unwrap();

        assert_eq!(devices.data.len(), 2);
        match topology.data {
            MetricData::Topology(t) => assert_eq!(t.links.len(), 1),
            other => panic!("expected topology, got {:?}", other),
        }
        assert_eq!(mock.count(Method::GET, "/api/s/default/stat/device"), 1);
        assert_eq!(mock.count(Method::POST, "/api/login"), 1);
        assert_eq!(mock.count(Method::GET, "/api/self/sites"), 1);

        let clients = gateway.get_data(&cfg, "clients").await.unwrap();
        assert_eq!(clients.data.len(), 1);
        assert_eq!(mock.count(Method::GET, "/api/s/default/stat/sta"), 1);
        assert_eq!(mock.count(Method::GET, "/api/s/default/stat/device"), 1);
    }

    #[tokio::test]
    async fn test_unknown_metric_fails_without_requests() {
        let mock = scripted();
        let gateway = gateway(&mock);

        let err = gateway.get_data(&config("h1"), "bandwidth").await.unwrap_err();
        assert!(matches!(err, ApiError::UnknownMetric(_)));
        assert_eq!(mock.total(), 0);
    }

    #[tokio::test]
    async fn test_missing_endpoint_degrades_to_empty() {
        let mock = scripted();
        mock.on_get("/api/s/default/stat/health", 404, "");
        let gateway = gateway(&mock);

        let report = gateway.get_data(&config("h1"), "health").await.unwrap();
        assert!(report.data.is_empty());
        assert_eq!(
            report.message.as_deref(),
            Some("health is not available on this controller")
        );
    }

    #[tokio::test]
    async fn test_login_failure_propagates_from_get_data() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post("/api/login", 429, "");
        let gateway = gateway(&mock);

        let err = gateway.get_data(&config("h1"), "devices").await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_api_key_metrics() {
        let mock = Arc::new(MockTransport::new());
        mock.on_get(
            "/proxy/network/integration/v1/sites",
            200,
            r#"{"data":[{"id":"88f7af54-98f8-306a-a1c7-c9349722b1f6","name":"Default"}],"totalCount":1}"#,
        );
        mock.on_get(
            "/proxy/network/integration/v1/sites/88f7af54-98f8-306a-a1c7-c9349722b1f6/devices?limit=200",
            200,
            r#"{"data":[{"id":"d1","macAddress":"aa:00","name":"Gateway","state":"ONLINE"}]}"#,
        );
        let gateway = gateway(&mock);
        let cfg = ControllerConfig::new("h1").with_api_key("k-1");

        let devices = gateway.get_data(&cfg, "devices").await.unwrap();
        assert_eq!(devices.site, "88f7af54-98f8-306a-a1c7-c9349722b1f6");
        assert_eq!(devices.data.len(), 1);

        let before = mock.total();
        let health = gateway.get_data(&cfg, "health").await.unwrap();
        assert!(health.data.is_empty());
        assert!(health.message.unwrap().contains("API-key"));
        assert_eq!(mock.total(), before);
    }

    #[tokio::test]
    async fn test_clear_caches_is_scoped_by_host() {
        let mock = scripted();
        let gateway = gateway(&mock);

        gateway.get_data(&config("host-a"), "devices").await.unwrap();
        gateway.get_data(&config("host-b"), "devices").await.unwrap();
        gateway
            .sessions()
            .backoff()
            .record_failure("host-a:443:bob", ApiError::Timeout);

        let report = gateway.clear_caches(Some("HOST-A"));
        // session, site id, endpoint payload and failure record
        assert_eq!(report.cleared_count, 4);

        let stats = gateway.stats();
        assert_eq!(stats.sessions.len(), 1);
        assert!(stats.sessions[0].0.contains("host-b"));
        assert_eq!(stats.site_ids.len(), 1);
        assert_eq!(stats.endpoints.len(), 1);
        assert!(stats.backoff.is_empty());

        // host-b is still served from cache
        gateway.get_data(&config("host-b"), "devices").await.unwrap();
        assert_eq!(mock.count(Method::GET, "/api/s/default/stat/device"), 2);
        assert_eq!(mock.count(Method::POST, "/api/login"), 2);

        let report = gateway.clear_caches(None);
        assert_eq!(report.cleared_count, 3);
        assert!(gateway.stats().sessions.is_empty());
    }

    #[tokio::test]
    async fn test_connection_report() {
        let mock = scripted();
        let gateway = gateway(&mock);

        let report = gateway.test_connection(&config("h1")).await;
        assert!(report.success);
        assert_eq!(report.details["sites"], 1);
        assert_eq!(report.details["auth_mode"], "session");

        let failing = Arc::new(MockTransport::new());
        failing.on_post("/api/login", 401, "");
        let report = Gateway::new(failing as Arc<dyn Transport>)
            .test_connection(&config("h1"))
            .await;
        assert!(!report.success);
        assert!(report.message.contains("local"));
    }

    #[tokio::test]
    async fn test_retry_now_lifts_cooldown() {
        let mock = Arc::new(MockTransport::new());
        mock.on_post("/api/login", 429, "");
        let gateway = gateway(&mock);
        let cfg = config("h1");

        gateway.get_data(&cfg, "devices").await.unwrap_err();
        assert!(gateway.retry_now(&cfg));
        assert!(!gateway.retry_now(&cfg));
    }
}
