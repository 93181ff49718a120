//! Common display utilities and helpers

use std::time::Duration;

/// Truncate string to max length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Uptime in seconds as `3d 4h`, `4h 12m` or `12m`
pub fn format_uptime(seconds: Option<u64>) -> String {
    let Some(secs) = seconds else {
        return "-".to_string();
    };
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Time left on a cache entry or cool-down, e.g. `24m 59s`
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a much longer value", 10), "a much ...");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(None), "-");
        assert_eq!(format_uptime(Some(59)), "0m");
        assert_eq!(format_uptime(Some(4 * 3600 + 12 * 60)), "4h 12m");
        assert_eq!(format_uptime(Some(3 * 86_400 + 4 * 3600)), "3d 4h");
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(45)), "45s");
        assert_eq!(format_remaining(Duration::from_secs(1499)), "24m 59s");
    }
}
