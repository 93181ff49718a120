//! Metric fetchers
//!
//! Each metric maps to one controller resource fetched through the endpoint
//! cache. `devices` and `topology` read the same resource, so polling both
//! costs one upstream request per cache window.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use super::endpoint::EndpointCache;
use crate::client::models::{
    Alarm, Device, HealthSubsystem, NetworkClient, SystemInfo, Topology, data_items, parse_items,
};
use crate::client::{AuthMode, AuthedClient};
use crate::error::{ApiError, ApiResult};

/// Page size requested from the integration API
const INTEGRATION_PAGE_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Devices,
    Clients,
    Health,
    Alarms,
    Sysinfo,
    Topology,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Devices,
        Metric::Clients,
        Metric::Health,
        Metric::Alarms,
        Metric::Sysinfo,
        Metric::Topology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Devices => "devices",
            Metric::Clients => "clients",
            Metric::Health => "health",
            Metric::Alarms => "alarms",
            Metric::Sysinfo => "sysinfo",
            Metric::Topology => "topology",
        }
    }

    /// Resource path for this metric, or `None` where the client's API has
    /// no equivalent.
    pub fn resource_path(&self, client: &AuthedClient, site: &str) -> Option<String> {
        match client.auth_mode() {
            AuthMode::Session => {
                let stat = match self {
                    Metric::Devices | Metric::Topology => "device",
                    Metric::Clients => "sta",
                    Metric::Health => "health",
                    Metric::Alarms => "alarm",
                    Metric::Sysinfo => "sysinfo",
                };
                Some(client.network_path(&format!("/api/s/{}/stat/{}", site, stat)))
            }
            AuthMode::ApiKey => match self {
                Metric::Devices | Metric::Topology => Some(format!(
                    "/proxy/network/integration/v1/sites/{}/devices?limit={}",
                    site, INTEGRATION_PAGE_LIMIT
                )),
                Metric::Clients => Some(format!(
                    "/proxy/network/integration/v1/sites/{}/clients?limit={}",
                    site, INTEGRATION_PAGE_LIMIT
                )),
                Metric::Sysinfo => Some("/proxy/network/integration/v1/info".to_string()),
                Metric::Health | Metric::Alarms => None,
            },
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ApiError::UnknownMetric(s.to_string()))
    }
}

/// Parsed data for one metric
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MetricData {
    Devices(Vec<Device>),
    Clients(Vec<NetworkClient>),
    Health(Vec<HealthSubsystem>),
    Alarms(Vec<Alarm>),
    Sysinfo(Option<SystemInfo>),
    Topology(Topology),
}

impl MetricData {
    /// Empty result used when a metric degrades
    pub fn empty(metric: Metric) -> Self {
        match metric {
            Metric::Devices => MetricData::Devices(Vec::new()),
            Metric::Clients => MetricData::Clients(Vec::new()),
            Metric::Health => MetricData::Health(Vec::new()),
            Metric::Alarms => MetricData::Alarms(Vec::new()),
            Metric::Sysinfo => MetricData::Sysinfo(None),
            Metric::Topology => MetricData::Topology(Topology::default()),
        }
    }

    /// Number of items
    pub fn len(&self) -> usize {
        match self {
            MetricData::Devices(v) => v.len(),
            MetricData::Clients(v) => v.len(),
            MetricData::Health(v) => v.len(),
            MetricData::Alarms(v) => v.len(),
            MetricData::Sysinfo(info) => usize::from(info.is_some()),
            MetricData::Topology(t) => t.nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetch one metric through the endpoint cache.
///
/// Returns `Ok(None)` when the metric has no resource for this client.
pub async fn fetch(
    endpoints: &EndpointCache,
    client: &AuthedClient,
    site: &str,
    metric: Metric,
) -> ApiResult<Option<MetricData>> {
    let Some(path) = metric.resource_path(client, site) else {
        return Ok(None);
    };
    let payload = endpoints.get_json(client, &path).await?;

    let data = match metric {
        Metric::Devices => MetricData::Devices(parse_items(&payload)?),
        Metric::Topology => {
            let devices: Vec<Device> = parse_items(&payload)?;
            MetricData::Topology(Topology::from_devices(&devices))
        }
        Metric::Clients => MetricData::Clients(parse_items(&payload)?),
        Metric::Health => MetricData::Health(parse_items(&payload)?),
        Metric::Alarms => {
            let mut alarms: Vec<Alarm> = parse_items(&payload)?;
            alarms.retain(|a| !a.archived);
            MetricData::Alarms(alarms)
        }
        Metric::Sysinfo => MetricData::Sysinfo(parse_single(&payload)?),
    };
    Ok(Some(data))
}

/// First item of an envelope, or the payload itself when it is a bare object
fn parse_single(payload: &Value) -> ApiResult<Option<SystemInfo>> {
    let item = if payload.get("data").is_some() {
        data_items(payload)?.into_iter().next()
    } else if payload.is_object() {
        Some(payload.clone())
    } else {
        None
    };
    Ok(item.and_then(|v| serde_json::from_value(v).ok()))
}

/// Message shown alongside degraded (empty) data
pub fn degraded_message(metric: Metric, error: &ApiError) -> String {
    match error {
        ApiError::ResourceUnavailable(_) => {
            format!("{} is not available on this controller", metric)
        }
        other => format!("{} unavailable: {}", metric, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_from_str() {
        assert_eq!("devices".parse::<Metric>().unwrap(), Metric::Devices);
        assert_eq!(" Topology ".parse::<Metric>().unwrap(), Metric::Topology);
        assert!(matches!(
            "bandwidth".parse::<Metric>(),
            Err(ApiError::UnknownMetric(ref m)) if m == "bandwidth"
        ));
    }

    #[test]
    fn test_parse_single_shapes() {
        let envelope = json!({"meta": {"rc": "ok"}, "data": [{"version": "8.0.24", "hostname": "unifi"}]});
        let info = parse_single(&envelope).unwrap().unwrap();
        assert_eq!(info.version.as_deref(), Some("8.0.24"));

        let bare = json!({"applicationVersion": "9.0.114"});
        let info = parse_single(&bare).unwrap().unwrap();
        assert_eq!(info.version.as_deref(), Some("9.0.114"));

        assert!(parse_single(&json!({"data": []})).unwrap().is_none());
    }

    #[test]
    fn test_empty_data_lengths() {
        for metric in Metric::ALL {
            assert!(MetricData::empty(metric).is_empty());
        }
    }

    #[test]
    fn test_degraded_message() {
        let msg = degraded_message(
            Metric::Health,
            &ApiError::ResourceUnavailable("/api/s/default/stat/health".to_string()),
        );
        assert_eq!(msg, "health is not available on this controller");
    }
}
