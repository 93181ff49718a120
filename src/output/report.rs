//! Formatting for gateway reports

use colored::Colorize;
use tabled::Tabled;

use super::Formattable;
use super::json::{format_json, format_json_for};
use super::table::{format_plain, format_table};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::gateway::{CacheStats, ClearReport, ConnectionReport, MetricData, MetricReport};
use crate::models::{
    AlarmDisplay, CacheEntryDisplay, ClientDisplay, DeviceDisplay, HealthDisplay, LinkDisplay,
};

fn rows<T: Tabled>(rows: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_plain(rows),
        _ => format_table(rows),
    }
}

fn data_rows(data: &MetricData, format: OutputFormat) -> String {
    match data {
        MetricData::Devices(devices) => {
            let r: Vec<DeviceDisplay> = devices.iter().map(DeviceDisplay::from).collect();
            rows(&r, format)
        }
        MetricData::Clients(clients) => {
            let r: Vec<ClientDisplay> = clients.iter().map(ClientDisplay::from).collect();
            rows(&r, format)
        }
        MetricData::Health(health) => {
            let r: Vec<HealthDisplay> = health.iter().map(HealthDisplay::from).collect();
            rows(&r, format)
        }
        MetricData::Alarms(alarms) => {
            let r: Vec<AlarmDisplay> = alarms.iter().map(AlarmDisplay::from).collect();
            rows(&r, format)
        }
        MetricData::Topology(topology) => rows(&LinkDisplay::rows(topology), format),
        MetricData::Sysinfo(info) => match info {
            Some(info) => [
                ("Version", info.version.as_deref()),
                ("Hostname", info.hostname.as_deref()),
                ("Name", info.name.as_deref()),
                ("Timezone", info.timezone.as_deref()),
            ]
            .iter()
            .filter_map(|(label, value)| value.map(|v| format!("{:<10} {}", label, v)))
            .collect::<Vec<_>>()
            .join("\n"),
            None => String::new(),
        },
    }
}

impl Formattable for MetricReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if let OutputFormat::Json = format {
            return Ok(format_json(self)?);
        }

        let body = data_rows(&self.data, format);
        if let OutputFormat::Table = format {
            return Ok(body);
        }

        let mut out = format!(
            "{} {} {}\n",
            self.metric.to_string().bold(),
            format!("@ {}", self.site).dimmed(),
            format!("({})", self.data.len()).dimmed()
        );
        if let Some(ref message) = self.message {
            out.push_str(&format!("{} {}\n", "⚠".yellow(), message));
        }
        out.push_str(&body);
        Ok(out)
    }
}

impl Formattable for ConnectionReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if let OutputFormat::Json = format {
            let host = self.details["host"].as_str().unwrap_or_default();
            return Ok(format_json_for(self, host)?);
        }

        if !self.success {
            return Ok(format!("{} {}", "✗".red(), self.message));
        }
        let mut out = format!("{} {}", "✓".green(), self.message);
        if let Some(details) = self.details.as_object() {
            for (key, value) in details {
                let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                out.push_str(&format!("\n  {:<10} {}", key, value));
            }
        }
        Ok(out)
    }
}

impl Formattable for ClearReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(format_json(self)?),
            _ => Ok(format!("{} {}", "✓".green(), self.message)),
        }
    }
}

impl Formattable for CacheStats {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(format_json(&CacheEntryDisplay::rows(self))?),
            _ => Ok(rows(&CacheEntryDisplay::rows(self), format)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::Device;
    use crate::gateway::Metric;

    fn report(message: Option<&str>) -> MetricReport {
        MetricReport {
            metric: Metric::Devices,
            site: "default".to_string(),
            data: MetricData::Devices(vec![Device {
                mac: "aa:00".to_string(),
                name: Some("Gateway".to_string()),
                ..Default::default()
            }]),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_metric_report_json() {
        let out = report(None).format(OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["data"]["metric"], "devices");
        assert_eq!(parsed["data"]["data"][0]["name"], "Gateway");
        assert!(parsed["data"].get("message").is_none());
    }

    #[test]
    fn test_metric_report_pretty_shows_message() {
        colored::control::set_override(false);
        let out = report(Some("devices unavailable: timeout"))
            .format(OutputFormat::Pretty)
            .unwrap();
        assert!(out.starts_with("devices @ default (1)"));
        assert!(out.contains("devices unavailable: timeout"));
        assert!(out.contains("Gateway"));
    }

    #[test]
    fn test_failed_connection_report() {
        colored::control::set_override(false);
        let report = ConnectionReport {
            success: false,
            message: "refused".to_string(),
            details: serde_json::Value::Null,
        };
        assert_eq!(report.format(OutputFormat::Pretty).unwrap(), "✗ refused");
    }
}
