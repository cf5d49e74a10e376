//! Display formatting for pool figures.
//!
//! All functions are pure. Inputs the API may omit are accepted as `0.0` or
//! `None` and map to the same placeholder the dashboard shows for "no data".

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

const HASHRATE_UNITS: [&str; 6] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s"];

fn is_falsy(x: f64) -> bool {
    x == 0.0 || x.is_nan()
}

pub fn format_hashrate(hashrate: f64) -> String {
    if is_falsy(hashrate) {
        return "0 H/s".to_string();
    }
    let mut value = hashrate;
    let mut unit = 0;
    while value >= 1000.0 && unit < HASHRATE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.2} {}", value, HASHRATE_UNITS[unit])
}

/// en-US grouping with at most two fraction digits, e.g. `1234567.891` -> `1,234,567.89`.
pub fn format_number(num: f64) -> String {
    if is_falsy(num) {
        return "0".to_string();
    }
    let fixed = format!("{:.2}", num.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if num < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_difficulty(diff: f64) -> String {
    if is_falsy(diff) {
        return "--".to_string();
    }
    if diff >= 1e12 {
        format!("{:.2}T", diff / 1e12)
    } else if diff >= 1e9 {
        format!("{:.2}G", diff / 1e9)
    } else if diff >= 1e6 {
        format!("{:.2}M", diff / 1e6)
    } else if diff >= 1e3 {
        format!("{:.2}K", diff / 1e3)
    } else {
        format!("{:.2}", diff)
    }
}

pub fn format_time_ago(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(then) = timestamp else {
        return "--".to_string();
    };
    let elapsed_ms = (now - then).num_milliseconds();
    let seconds = elapsed_ms.div_euclid(1000);

    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

/// Keeps `start` leading and `end` trailing characters around an ellipsis.
pub fn truncate_address(address: &str, start: usize, end: usize) -> String {
    let len = address.chars().count();
    if len <= start + end {
        return address.to_string();
    }
    let head: String = address.chars().take(start).collect();
    let tail: String = address.chars().skip(len - end).collect();
    format!("{}...{}", head, tail)
}

/// Human scale for an expected wait given in hours.
pub fn format_duration_estimate(hours: f64) -> String {
    if hours < 1.0 {
        format!("{:.0} minutes", hours * 60.0)
    } else if hours < 24.0 {
        format!("{:.1} hours", hours)
    } else {
        format!("{:.1} days", hours / 24.0)
    }
}

pub fn format_fixed(value: Option<f64>, digits: usize) -> String {
    format!("{:.*}", digits, value.unwrap_or(0.0))
}

pub fn format_clock<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%H:%M:%S").to_string()
}

pub fn format_chart_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_hashrate_units_scale() {
        assert_eq!(format_hashrate(0.0), "0 H/s");
        assert_eq!(format_hashrate(f64::NAN), "0 H/s");
        assert_eq!(format_hashrate(999.0), "999.00 H/s");
        assert_eq!(format_hashrate(1500.0), "1.50 KH/s");
        assert_eq!(format_hashrate(2_340_000.0), "2.34 MH/s");
        assert_eq!(format_hashrate(7.5e12), "7.50 TH/s");
    }

    #[test]
    fn test_hashrate_clamps_at_peta() {
        assert_eq!(format_hashrate(3e18), "3000.00 PH/s");
    }

    #[test]
    fn test_number_grouping() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(1234.0), "1,234");
        assert_eq!(format_number(1_234_567.891), "1,234,567.89");
        assert_eq!(format_number(1000.5), "1,000.5");
        assert_eq!(format_number(-98765.4), "-98,765.4");
    }

    #[test]
    fn test_difficulty_suffixes() {
        assert_eq!(format_difficulty(0.0), "--");
        assert_eq!(format_difficulty(500.0), "500.00");
        assert_eq!(format_difficulty(1500.0), "1.50K");
        assert_eq!(format_difficulty(2_500_000.0), "2.50M");
        assert_eq!(format_difficulty(5_000_000_000.0), "5.00G");
        assert_eq!(format_difficulty(1.25e15), "1250.00T");
    }

    #[test]
    fn test_time_ago_tiers() {
        let now = Utc::now();
        assert_eq!(format_time_ago(None, now), "--");
        assert_eq!(format_time_ago(Some(now - Duration::milliseconds(30_000)), now), "30s ago");
        assert_eq!(format_time_ago(Some(now - Duration::seconds(150)), now), "2m ago");
        assert_eq!(format_time_ago(Some(now - Duration::milliseconds(7_200_000)), now), "2h ago");
        assert_eq!(format_time_ago(Some(now - Duration::days(3)), now), "3d ago");
    }

    #[test]
    fn test_time_ago_floors_partial_seconds() {
        let now = Utc::now();
        assert_eq!(format_time_ago(Some(now - Duration::milliseconds(59_999)), now), "59s ago");
    }

    #[test]
    fn test_address_truncation() {
        assert_eq!(truncate_address("abcdefghijklmnopqrstuvwxyz", 4, 4), "abcd...wxyz");
        assert_eq!(truncate_address("abcdefgh", 4, 4), "abcdefgh");
        assert_eq!(truncate_address("abc", 4, 4), "abc");
        assert_eq!(truncate_address("", 10, 8), "");
    }

    #[test]
    fn test_duration_estimate_scales() {
        assert_eq!(format_duration_estimate(0.5), "30 minutes");
        assert_eq!(format_duration_estimate(5.3), "5.3 hours");
        assert_eq!(format_duration_estimate(72.0), "3.0 days");
    }

    #[test]
    fn test_clock_labels() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 7, 4, 9).unwrap();
        assert_eq!(format_clock(&at), "07:04:09");
        assert_eq!(format_chart_label(&at), "07:04");
    }
}
