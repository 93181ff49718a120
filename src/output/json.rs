//! JSON output formatting
//!
//! Every JSON document is wrapped in an envelope with the CLI version, a
//! timestamp and, where there is one, the controller it came from.

use chrono::Utc;
use serde::Serialize;

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// RFC 3339 time the output was produced
    pub timestamp: String,

    /// CLI version
    pub version: String,

    /// Controller host the data came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                host: None,
            },
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.meta.host = Some(host.into());
        self
    }
}

/// Format data as pretty-printed JSON
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

/// Format data as pretty-printed JSON tagged with its controller host
pub fn format_json_for<T: Serialize + ?Sized>(
    data: &T,
    host: &str,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data).with_host(host))
}
