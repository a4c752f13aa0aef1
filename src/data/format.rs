use std::time::Duration;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Format a byte or item count with binary K/M/G suffixes (e.g. 1536 -> "1.5K").
pub fn human_size(n: u64) -> String {
    let v = n as f64;
    if v >= GIB {
        format!("{:.1}G", v / GIB)
    } else if v >= MIB {
        format!("{:.1}M", v / MIB)
    } else if v >= KIB {
        format!("{:.1}K", v / KIB)
    } else {
        n.to_string()
    }
}

/// Format an uptime as `"[Nd ]HH:MM:SS"`.
pub fn format_uptime(d: Duration) -> String {
    let secs = d.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Format a message rate, or "N/A" when the broker reported none.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}", r),
        None => "N/A".to_string(),
    }
}
