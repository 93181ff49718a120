//! Alarm display model

use serde::Serialize;
use tabled::Tabled;

use super::common::truncate_string;
use crate::client::models::Alarm;

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct AlarmDisplay {
    #[tabled(rename = "TIME")]
    pub time: String,

    #[tabled(rename = "KEY")]
    pub key: String,

    #[tabled(rename = "MESSAGE")]
    pub message: String,
}

impl From<&Alarm> for AlarmDisplay {
    fn from(alarm: &Alarm) -> Self {
        Self {
            time: alarm.datetime.clone().unwrap_or_default(),
            key: alarm.key.clone(),
            message: truncate_string(&alarm.msg, 60),
        }
    }
}
