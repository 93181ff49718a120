//! Controller alarms

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alarm {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Event key, e.g. `EVT_GW_WANTransition`
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub msg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(default)]
    pub archived: bool,
}
