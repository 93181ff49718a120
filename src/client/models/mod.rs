//! Controller data models
//!
//! Payloads from both the session API (`{"meta": {...}, "data": [...]}`) and
//! the API-key integration API (`{"data": [...], "totalCount": n}`) are parsed
//! into these types. Fields are lenient: firmware versions disagree on which
//! fields exist, so nearly everything is optional or defaulted.

mod alarm;
mod device;
mod health;
mod site;
mod station;
mod system;

pub use alarm::Alarm;
pub use device::{Device, DeviceState, Topology, TopologyLink, TopologyNode, Uplink};
pub use health::HealthSubsystem;
pub use site::SiteSummary;
pub use station::NetworkClient;
pub use system::SystemInfo;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Extract the `data` array from a controller envelope.
///
/// Fails when the envelope reports `meta.rc == "error"`; a bare array is
/// accepted as-is and a missing `data` field is an empty list.
pub fn data_items(payload: &Value) -> ApiResult<Vec<Value>> {
    if let Some(meta) = payload.get("meta")
        && meta.get("rc").and_then(Value::as_str) == Some("error")
    {
        let msg = meta
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("controller reported an error");
        return Err(ApiError::InvalidResponse(msg.to_string()));
    }

    match payload {
        Value::Array(items) => Ok(items.clone()),
        _ => match payload.get("data") {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::Object(_)) => Ok(vec![payload["data"].clone()]),
            _ => Ok(Vec::new()),
        },
    }
}

/// Parse every item of an envelope into `T`, skipping items that do not fit.
pub fn parse_items<T: DeserializeOwned>(payload: &Value) -> ApiResult<Vec<T>> {
    Ok(data_items(payload)?
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::debug!("Skipping unparseable item: {}", e);
                None
            }
        })
        .collect())
}
