//! Display helpers for the analytics view

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Human-readable byte size: `512 B`, `2.0 KB`, `1.5 MB`
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Relative age of `timestamp` as seen at `now` (both epoch millis)
pub fn format_time_ago(timestamp: i64, now: i64) -> String {
    let mins = (now - timestamp).div_euclid(60_000);
    if mins < 1 {
        return "Just now".to_string();
    }
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(1536 * 1024), "1.5 MB");
    }

    #[test]
    fn test_format_time_ago() {
        let now = 10 * 24 * 3_600_000;
        assert_eq!(format_time_ago(now - 30_000, now), "Just now");
        assert_eq!(format_time_ago(now + 5_000, now), "Just now");
        assert_eq!(format_time_ago(now - 5 * 60_000, now), "5m ago");
        assert_eq!(format_time_ago(now - 3 * 3_600_000, now), "3h ago");
        assert_eq!(format_time_ago(now - 49 * 3_600_000, now), "2d ago");
    }
}
