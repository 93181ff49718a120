//! Network devices and the topology derived from them

use serde::{Deserialize, Deserializer, Serialize};

/// Adopted network device (gateway, switch, access point)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    /// Device id (integration API)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// MAC address
    #[serde(default, alias = "macAddress")]
    pub mac: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Device type code (`uap`, `usw`, `ugw`, ...)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, alias = "ipAddress", skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(default, alias = "firmwareVersion", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "deserialize_state")]
    pub state: DeviceState,

    /// Uptime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,

    /// Connected clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sta: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink: Option<Uplink>,
}

impl Device {
    /// Name for display, falling back to model then MAC
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.model.as_deref())
            .unwrap_or(&self.mac)
    }
}

/// Upstream link of a device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Uplink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink_mac: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink_remote_port: Option<u32>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Connection state, normalized from numeric codes and string labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Online,
    Offline,
    Pending,
    Upgrading,
    #[default]
    Unknown,
}

impl DeviceState {
    fn from_code(code: i64) -> Self {
        match code {
            0 => DeviceState::Offline,
            1 => DeviceState::Online,
            2 | 7 | 8 | 9 | 10 | 11 => DeviceState::Pending,
            4 | 5 => DeviceState::Upgrading,
            _ => DeviceState::Unknown,
        }
    }

    fn from_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "ONLINE" | "CONNECTED" => DeviceState::Online,
            "OFFLINE" | "DISCONNECTED" => DeviceState::Offline,
            "PENDING_ADOPTION" | "ADOPTING" | "PROVISIONING" | "GETTING_READY" => {
                DeviceState::Pending
            }
            "UPDATING" | "UPGRADING" => DeviceState::Upgrading,
            _ => DeviceState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Online => "online",
            DeviceState::Offline => "offline",
            DeviceState::Pending => "pending",
            DeviceState::Upgrading => "upgrading",
            DeviceState::Unknown => "unknown",
        }
    }
}

fn deserialize_state<'de, D>(deserializer: D) -> Result<DeviceState, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Code(i64),
        Label(String),
        Other(serde_json::Value),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Code(code) => DeviceState::from_code(code),
        Raw::Label(label) => DeviceState::from_label(&label),
        Raw::Other(_) => DeviceState::Unknown,
    })
}

/// Device graph built from uplink references
#[derive(Debug, Clone, Default, Serialize)]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
    pub links: Vec<TopologyLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopologyNode {
    pub mac: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub state: DeviceState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyLink {
    /// Upstream device MAC
    pub from: String,
    /// Downstream device MAC
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
}

impl Topology {
    /// Link every device to the uplink it reports, when that uplink is a
    /// known device.
    pub fn from_devices(devices: &[Device]) -> Self {
        let nodes: Vec<TopologyNode> = devices
            .iter()
            .map(|d| TopologyNode {
                mac: d.mac.to_ascii_lowercase(),
                name: d.display_name().to_string(),
                kind: d.kind.clone(),
                state: d.state,
            })
            .collect();

        let links = devices
            .iter()
            .filter_map(|d| {
                let uplink = d.uplink.as_ref()?;
                let from = uplink.uplink_mac.as_deref()?.to_ascii_lowercase();
                nodes.iter().any(|n| n.mac == from).then(|| TopologyLink {
                    from,
                    to: d.mac.to_ascii_lowercase(),
                    port: uplink.uplink_remote_port,
                })
            })
            .collect();

        Self { nodes, links }
    }
}
