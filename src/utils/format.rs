use chrono::Duration;

/// `HH:MM:SS`, negative spans shown as zero.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Minutes below an hour as `X.X min`, otherwise `X.X hrs`.
pub fn minutes_to_pretty(minutes: f64) -> String {
    if minutes < 60.0 {
        format!("{minutes:.1} min")
    } else {
        format!("{:.1} hrs", minutes / 60.0)
    }
}
