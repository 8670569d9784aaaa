//! Value formatting shared by the report sinks

use chrono::{DateTime, Utc};

/// Significant digits used in report tables
pub const SIGNIFICANT_DIGITS: usize = 4;

/// Format `value` with `digits` significant digits, trailing zeros removed
///
/// Magnitudes below 1e-4 or with more integer digits than `digits` switch
/// to exponent notation.
pub fn significant(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let digits = digits.max(1);
    let magnitude = value.abs().log10().floor() as i32;
    if magnitude < -4 || magnitude >= digits as i32 {
        let text = format!("{:.*e}", digits - 1, value);
        return match text.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{exponent}", trim_zeros(mantissa)),
            None => text,
        };
    }

    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    trim_zeros(&format!("{value:.decimals$}")).to_string()
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Optional statistic for a table cell
pub fn optional(value: Option<f64>) -> String {
    value
        .map(|v| significant(v, SIGNIFICANT_DIGITS))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Nanosecond log time as a UTC date
pub fn utc_time(timestamp_ns: u64) -> String {
    let secs = (timestamp_ns / 1_000_000_000) as i64;
    let nanos = (timestamp_ns % 1_000_000_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| timestamp_ns.to_string())
}

/// Quote a CSV field when it contains a separator, quote or line break
pub fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// File-system safe stem for a task id
pub fn file_stem(task_id: &str) -> String {
    task_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significant() {
        assert_eq!(significant(3.0, 4), "3");
        assert_eq!(significant(1.41421356, 4), "1.414");
        assert_eq!(significant(0.01, 4), "0.01");
        assert_eq!(significant(0.0123456, 4), "0.01235");
        assert_eq!(significant(99.5, 4), "99.5");
        assert_eq!(significant(1234.0, 4), "1234");
        assert_eq!(significant(123456.0, 4), "1.235e5");
        assert_eq!(significant(-2.5, 4), "-2.5");
        assert_eq!(significant(0.0, 4), "0");
        assert_eq!(significant(1.7e18, 4), "1.7e18");
        assert_eq!(significant(2.5e-7, 4), "2.5e-7");
        assert_eq!(significant(f64::NAN, 4), "NaN");
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(None), "N/A");
        assert_eq!(optional(Some(100.0)), "100");
    }

    #[test]
    fn test_utc_time() {
        assert_eq!(utc_time(0), "1970-01-01 00:00:00.000 UTC");
        assert_eq!(
            utc_time(1_700_000_000_123_000_000),
            "2023-11-14 22:13:20.123 UTC"
        );
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("imu_rate"), "imu_rate");
        assert_eq!(file_stem("a/b c"), "a_b_c");
    }
}
