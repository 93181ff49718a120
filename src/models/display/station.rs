//! Client display model

use serde::Serialize;
use tabled::Tabled;

use super::common::truncate_string;
use crate::client::models::NetworkClient;

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ClientDisplay {
    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "MAC")]
    pub mac: String,

    #[tabled(rename = "IP")]
    pub ip: String,

    #[tabled(rename = "LINK")]
    pub link: String,

    #[tabled(rename = "SSID")]
    pub ssid: String,
}

impl From<&NetworkClient> for ClientDisplay {
    fn from(client: &NetworkClient) -> Self {
        let link = match client.wired() {
            Some(true) => "wired",
            Some(false) => "wireless",
            None => "",
        };
        Self {
            name: truncate_string(client.display_name(), 30),
            mac: client.mac.clone(),
            ip: client.ip.clone().unwrap_or_default(),
            link: link.to_string(),
            ssid: client.essid.clone().unwrap_or_default(),
        }
    }
}
