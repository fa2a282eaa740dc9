use chrono::{TimeZone, Utc};

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * 1024 * 1024;

/// Relative age of a unix timestamp (seconds), e.g. "3 mins ago".
/// Returns "Unknown" for a zero timestamp.
pub fn format_block_time(timestamp: i64) -> String {
    format_block_time_at(timestamp, Utc::now().timestamp())
}

/// Same as [`format_block_time`] against an explicit `now` (seconds).
pub fn format_block_time_at(timestamp: i64, now: i64) -> String {
    if timestamp == 0 {
        return "Unknown".to_string();
    }

    let diff_mins = now.saturating_sub(timestamp).div_euclid(60);
    if diff_mins < 1 {
        return "Just now".to_string();
    }
    if diff_mins < 60 {
        return plural(diff_mins, "min");
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return plural(diff_hours, "hour");
    }

    let diff_days = diff_hours / 24;
    if diff_days < 7 {
        return plural(diff_days, "day");
    }

    let diff_weeks = diff_days / 7;
    if diff_weeks < 4 {
        return plural(diff_weeks, "week");
    }

    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "Unknown".to_string(),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Byte size with binary units and one decimal place: "1.5 KB", "1.0 MB"
pub fn format_block_size(bytes: u64) -> String {
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}

/// Transaction size, or "Unknown" when the payload was absent
pub fn format_transaction_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(b) if b > 0 => format_block_size(b),
        _ => "Unknown".to_string(),
    }
}

/// Shorten a hash to `length` chars followed by "..."
pub fn format_transaction_hash(hash: &str, length: usize) -> String {
    if hash.chars().count() <= length {
        return hash.to_string();
    }
    let head: String = hash.chars().take(length).collect();
    format!("{head}...")
}

/// Thousands separators: 1234567 -> "1,234,567"
pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Size in bytes of a base64 payload, derived from its encoded length
pub fn base64_decoded_len(encoded: &str) -> u64 {
    (encoded.len() as u64 * 3) / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn relative_time_thresholds() {
        assert_eq!(format_block_time_at(NOW - 59, NOW), "Just now");
        assert_eq!(format_block_time_at(NOW - 61, NOW), "1 min ago");
        assert_eq!(format_block_time_at(NOW - 5 * 60, NOW), "5 mins ago");
        assert_eq!(format_block_time_at(NOW - 3700, NOW), "1 hour ago");
        assert_eq!(format_block_time_at(NOW - 5 * 3600, NOW), "5 hours ago");
        assert_eq!(format_block_time_at(NOW - 86_400, NOW), "1 day ago");
        assert_eq!(format_block_time_at(NOW - 3 * 86_400, NOW), "3 days ago");
        assert_eq!(format_block_time_at(NOW - 7 * 86_400, NOW), "1 week ago");
        assert_eq!(format_block_time_at(NOW - 21 * 86_400, NOW), "3 weeks ago");
    }

    #[test]
    fn relative_time_falls_back_to_date() {
        // 2023-11-14T22:13:20Z minus 60 days
        assert_eq!(format_block_time_at(NOW - 60 * 86_400, NOW), "2023-09-15");
        assert_eq!(format_block_time_at(0, NOW), "Unknown");
        // Clock skew: future timestamps are "Just now"
        assert_eq!(format_block_time_at(NOW + 30, NOW), "Just now");
        // Out-of-range timestamps do not overflow
        assert_eq!(format_block_time_at(i64::MIN, NOW), "Unknown");
        assert_eq!(format_block_time_at(i64::MAX, i64::MIN), "Just now");
    }

    #[test]
    fn block_size_units() {
        assert_eq!(format_block_size(0), "0 B");
        assert_eq!(format_block_size(1023), "1023 B");
        assert_eq!(format_block_size(1536), "1.5 KB");
        assert_eq!(format_block_size(1_048_576), "1.0 MB");
        assert_eq!(format_block_size(3 * GB), "3.0 GB");
        assert_eq!(format_transaction_size(None), "Unknown");
        assert_eq!(format_transaction_size(Some(0)), "Unknown");
    }

    #[test]
    fn numbers_and_hashes() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_transaction_hash("TX~abcdefghij", 5), "TX~ab...");
        assert_eq!(format_transaction_hash("short", 10), "short");
        assert_eq!(base64_decoded_len("AAAA"), 3);
        assert_eq!(base64_decoded_len("AAAAAA=="), 6);
    }
}
