//! Site health summary

use serde::{Deserialize, Serialize};

/// Health of one subsystem (`wan`, `lan`, `wlan`, `www`, `vpn`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthSubsystem {
    pub subsystem: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_user: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_adopted: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_disconnected: Option<u32>,

    #[serde(default, rename = "tx_bytes-r", skip_serializing_if = "Option::is_none")]
    pub tx_rate: Option<f64>,

    #[serde(default, rename = "rx_bytes-r", skip_serializing_if = "Option::is_none")]
    pub rx_rate: Option<f64>,
}

impl HealthSubsystem {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }
}
