//! Connected clients (stations)

use serde::{Deserialize, Serialize};

/// A client connected to the network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkClient {
    #[serde(default, alias = "macAddress")]
    pub mac: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, alias = "ipAddress", skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_wired: Option<bool>,

    /// Connection type label from the integration API (`WIRED`, `WIRELESS`)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_bytes: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_bytes: Option<u64>,
}

impl NetworkClient {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.hostname.as_deref())
            .unwrap_or(&self.mac)
    }

    /// Wired flag from whichever field the controller sent
    pub fn wired(&self) -> Option<bool> {
        self.is_wired.or_else(|| {
            self.kind
                .as_deref()
                .map(|k| k.eq_ignore_ascii_case("wired"))
        })
    }
}
