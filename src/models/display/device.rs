//! Device and topology display models

use serde::Serialize;
use tabled::Tabled;

use super::common::{format_uptime, truncate_string};
use crate::client::models::{Device, Topology, TopologyLink};

/// Device display model for table output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct DeviceDisplay {
    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "MODEL")]
    pub model: String,

    #[tabled(rename = "IP")]
    pub ip: String,

    #[tabled(rename = "STATE")]
    pub state: String,

    #[tabled(rename = "CLIENTS")]
    pub clients: String,

    #[tabled(rename = "UPTIME")]
    pub uptime: String,
}

impl From<&Device> for DeviceDisplay {
    fn from(device: &Device) -> Self {
        Self {
            name: truncate_string(device.display_name(), 30),
            model: device.model.clone().unwrap_or_default(),
            ip: device.ip.clone().unwrap_or_default(),
            state: device.state.as_str().to_string(),
            clients: device.num_sta.map(|n| n.to_string()).unwrap_or_default(),
            uptime: format_uptime(device.uptime),
        }
    }
}

/// One uplink edge, with device names resolved
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct LinkDisplay {
    #[tabled(rename = "UPSTREAM")]
    pub upstream: String,

    #[tabled(rename = "DOWNSTREAM")]
    pub downstream: String,

    #[tabled(rename = "PORT")]
    pub port: String,
}

impl LinkDisplay {
    pub fn rows(topology: &Topology) -> Vec<Self> {
        let name_of = |mac: &str| {
            topology
                .nodes
                .iter()
                .find(|n| n.mac == mac)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| mac.to_string())
        };
        topology
            .links
            .iter()
            .map(|link: &TopologyLink| Self {
                upstream: name_of(&link.from),
                downstream: name_of(&link.to),
                port: link.port.map(|p| p.to_string()).unwrap_or_default(),
            })
            .collect()
    }
}
