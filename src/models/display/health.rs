//! Health display model

use serde::Serialize;
use tabled::Tabled;

use crate::client::models::HealthSubsystem;

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct HealthDisplay {
    #[tabled(rename = "SUBSYSTEM")]
    pub subsystem: String,

    #[tabled(rename = "STATUS")]
    pub status: String,

    #[tabled(rename = "USERS")]
    pub users: String,

    #[tabled(rename = "ADOPTED")]
    pub adopted: String,
}

impl From<&HealthSubsystem> for HealthDisplay {
    fn from(health: &HealthSubsystem) -> Self {
        let count = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_default();
        Self {
            subsystem: health.subsystem.clone(),
            status: health.status.clone().unwrap_or_else(|| "unknown".to_string()),
            users: count(health.num_user),
            adopted: count(health.num_adopted),
        }
    }
}
