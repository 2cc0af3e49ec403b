//! Cell parsers for broker export values.
//!
//! Numeric parsers never fail: anything unparseable becomes zero. Only date
//! parsing can reject a cell, which discards the whole record.

use chrono::NaiveDate;

/// Minus signs seen in Japanese broker exports (ASCII, U+2212, full-width).
const MINUS_SIGNS: [char; 3] = ['-', '\u{2212}', '\u{FF0D}'];
const YEN_SUFFIX: char = '円';

/// Length of the longest prefix of `s` that looks like a signed integer.
fn int_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        0
    } else {
        i
    }
}

/// Length of the longest prefix of `s` that looks like a signed decimal,
/// with an optional exponent.
fn float_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Parse the leading integer of `s`, ignoring trailing garbage.
fn leading_int(s: &str) -> Option<i64> {
    let len = int_prefix_len(s);
    if len == 0 {
        return None;
    }
    s[..len].parse().ok()
}

/// Parse the leading decimal of `s`, ignoring trailing garbage.
fn leading_float(s: &str) -> Option<f64> {
    let len = float_prefix_len(s);
    if len == 0 {
        return None;
    }
    s[..len].parse().ok()
}

/// Parse a yen amount such as `1,234円`, `-500` or `−500`.
///
/// Empty and dash-only cells are zero.
pub fn parse_currency(value: &str) -> f64 {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();
    let dash_only = matches!(
        (chars.next(), chars.next()),
        (Some(c), None) if MINUS_SIGNS.contains(&c)
    );
    if trimmed.is_empty() || dash_only {
        return 0.0;
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1.0, &trimmed[1..]),
        Some(c) if MINUS_SIGNS.contains(&c) => (-1.0, &trimmed[c.len_utf8()..]),
        _ => (1.0, trimmed),
    };

    let digits: String = rest
        .chars()
        .filter(|&c| c != ',' && c != YEN_SUFFIX)
        .collect();

    leading_float(digits.trim()).map_or(0.0, |v| v * sign)
}

/// Parse an integer with thousands separators. Failure yields zero.
pub fn parse_integer(value: &str) -> i64 {
    let normalized = value.trim().replace(',', "");
    leading_int(&normalized).unwrap_or(0)
}

/// Parse a decimal with thousands separators. Failure yields zero.
pub fn parse_decimal(value: &str) -> f64 {
    let normalized = value.trim().replace(',', "");
    leading_float(&normalized).unwrap_or(0.0)
}

/// Convert a `YYYY/M/D` date to `YYYY-MM-DD`.
///
/// Returns `None` when a component is missing, non-numeric, or the result
/// is not a real calendar date.
pub fn to_iso_date(value: &str) -> Option<String> {
    let mut parts = value.trim().split('/').map(str::trim);
    let year = parts.next().filter(|s| !s.is_empty())?;
    let month = parts.next().filter(|s| !s.is_empty())?;
    let day = parts.next().filter(|s| !s.is_empty())?;

    let all_digits =
        |s: &str, max_len: usize| s.len() <= max_len && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(year, 4) || !all_digits(month, 2) || !all_digits(day, 2) {
        return None;
    }

    let (y, m, d) = (year.parse().ok()?, month.parse().ok()?, day.parse().ok()?);
    NaiveDate::from_ymd_opt(y, m, d)?;

    Some(format!("{:0>4}-{:0>2}-{:0>2}", year, month, day))
}

/// A normalized time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeOfDay {
    /// `HH:MM`
    pub fn hh_mm(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// `HH:MM:SS`
    pub fn hh_mm_ss(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

fn time_component(raw: Option<&str>, limit: i64) -> u32 {
    raw.and_then(|s| leading_int(s.trim()))
        .filter(|v| (0..limit).contains(v))
        .map_or(0, |v| v as u32)
}

/// Parse `H:M[:S]`. Missing, unparseable or out-of-range parts become zero.
pub fn parse_time(value: &str) -> TimeOfDay {
    let mut parts = value.trim().split(':');
    TimeOfDay {
        hour: time_component(parts.next(), 24),
        minute: time_component(parts.next(), 60),
        second: time_component(parts.next(), 60),
    }
}

/// Normalize a time cell to `HH:MM`.
pub fn normalize_time_string(value: &str) -> String {
    parse_time(value).hh_mm()
}

/// Date and time fields derived from one date-time cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParts {
    pub iso_date: String,
    pub iso_time: String,
    pub iso_date_time: String,
}

impl DateTimeParts {
    /// Combine an ISO date with a time of day.
    pub fn new(iso_date: String, time: TimeOfDay) -> Self {
        let iso_date_time = format!("{}T{}", iso_date, time.hh_mm_ss());
        Self {
            iso_date,
            iso_time: time.hh_mm(),
            iso_date_time,
        }
    }
}

/// Parse `YYYY/M/D[ H:M[:S]]`. A missing time means midnight.
pub fn parse_date_time(value: &str) -> Option<DateTimeParts> {
    let mut parts = value.split_whitespace();
    let iso_date = to_iso_date(parts.next()?)?;
    let time = parts.next().map(parse_time).unwrap_or_default();
    Some(DateTimeParts::new(iso_date, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_currency() {
        assert_relative_eq!(parse_currency("1,234円"), 1234.0);
        assert_relative_eq!(parse_currency("-500"), -500.0);
        assert_relative_eq!(parse_currency("\u{2212}500"), -500.0);
        assert_relative_eq!(parse_currency("\u{FF0D}1,500円"), -1500.0);
        assert_relative_eq!(parse_currency("+2,000"), 2000.0);
        assert_relative_eq!(parse_currency(" 12.5 "), 12.5);
    }

    #[test]
    fn test_parse_currency_zero_cases() {
        assert_eq!(parse_currency(""), 0.0);
        assert_eq!(parse_currency("   "), 0.0);
        assert_eq!(parse_currency("-"), 0.0);
        assert_eq!(parse_currency("\u{2212}"), 0.0);
        assert_eq!(parse_currency("n/a"), 0.0);
        assert_eq!(parse_currency("円"), 0.0);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("1,200"), 1200);
        assert_eq!(parse_integer(" 3 "), 3);
        assert_eq!(parse_integer("-4"), -4);
        assert_eq!(parse_integer("7枚"), 7);
        assert_eq!(parse_integer("abc"), 0);
        assert_eq!(parse_integer(""), 0);
    }

    #[test]
    fn test_parse_decimal() {
        assert_relative_eq!(parse_decimal("38,250.5"), 38250.5);
        assert_relative_eq!(parse_decimal("0.01"), 0.01);
        assert_relative_eq!(parse_decimal("1e3"), 1000.0);
        assert_eq!(parse_decimal("."), 0.0);
        assert_eq!(parse_decimal("inf"), 0.0);
        assert_eq!(parse_decimal(""), 0.0);
    }

    #[test]
    fn test_to_iso_date() {
        assert_eq!(to_iso_date("2024/3/5").as_deref(), Some("2024-03-05"));
        assert_eq!(to_iso_date("2024/12/31").as_deref(), Some("2024-12-31"));
        assert_eq!(to_iso_date(" 2024/01/09 ").as_deref(), Some("2024-01-09"));
    }

    #[test]
    fn test_to_iso_date_rejects() {
        assert_eq!(to_iso_date("2024/3"), None);
        assert_eq!(to_iso_date(""), None);
        assert_eq!(to_iso_date("2024//5"), None);
        assert_eq!(to_iso_date("2024-03-05"), None);
        assert_eq!(to_iso_date("2024/2/30"), None);
        assert_eq!(to_iso_date("2024/x/5"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(normalize_time_string("9:5"), "09:05");
        assert_eq!(normalize_time_string("14"), "14:00");
        assert_eq!(normalize_time_string(""), "00:00");
        assert_eq!(normalize_time_string("ab:30"), "00:30");
        assert_eq!(normalize_time_string("25:61"), "00:00");
        assert_eq!(parse_time("8:15:42").hh_mm_ss(), "08:15:42");
        assert_eq!(parse_time("8:15").hh_mm_ss(), "08:15:00");
    }

    #[test]
    fn test_parse_date_time() {
        let parts = parse_date_time("2024/1/10 9:03:07").unwrap();
        assert_eq!(parts.iso_date, "2024-01-10");
        assert_eq!(parts.iso_time, "09:03");
        assert_eq!(parts.iso_date_time, "2024-01-10T09:03:07");

        let date_only = parse_date_time(" 2024/1/10 ").unwrap();
        assert_eq!(date_only.iso_time, "00:00");
        assert_eq!(date_only.iso_date_time, "2024-01-10T00:00:00");

        assert!(parse_date_time("").is_none());
        assert!(parse_date_time("2024/1 9:00").is_none());
    }
}
