//! Strict `YYYY-MM-DD HH:MM:SS` timestamp parsing.
//!
//! Load files carry wall-clock timestamps in exactly one fixed-width layout.
//! Anything else (single-digit fields, a `T` separator, trailing text) is
//! rejected so a malformed cell cannot be silently mis-ordered in the store.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static LAYOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})$")
        .expect("valid timestamp regex")
});

/// Parse a `YYYY-MM-DD HH:MM:SS` string into nanoseconds since the UNIX
/// epoch, interpreted as UTC.
///
/// Returns `None` for layout violations and out-of-range calendar fields.
/// A year, month, or day of zero is rejected; a zero hour, minute, or second
/// is a valid time of day.
pub fn parse_timestamp_ns(text: &str) -> Option<i64> {
    let caps = LAYOUT.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let second: u32 = caps[6].parse().ok()?;

    if year == 0 || month == 0 || day == 0 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, second)?
        .and_utc()
        .timestamp_nanos_opt()
}

#[cfg(test)]
mod tests {
    use super::parse_timestamp_ns;

    #[test]
    fn accepts_canonical_layout() {
        let ns = parse_timestamp_ns("2009-01-15 08:30:00").unwrap();
        assert_eq!(ns, 1_232_008_200 * 1_000_000_000);
    }

    #[test]
    fn midnight_is_valid() {
        let ns = parse_timestamp_ns("1970-01-01 00:00:00").unwrap();
        assert_eq!(ns, 0);
    }

    #[test]
    fn pre_epoch_is_negative() {
        let ns = parse_timestamp_ns("1969-12-31 23:59:59").unwrap();
        assert_eq!(ns, -1_000_000_000);
    }

    #[test]
    fn rejects_unpadded_fields() {
        assert!(parse_timestamp_ns("2009-1-15 08:30:00").is_none());
        assert!(parse_timestamp_ns("2009-01-15 8:30:00").is_none());
    }

    #[test]
    fn rejects_other_separators() {
        assert!(parse_timestamp_ns("2009-01-15T08:30:00").is_none());
        assert!(parse_timestamp_ns("2009/01/15 08:30:00").is_none());
    }

    #[test]
    fn rejects_trailing_text() {
        assert!(parse_timestamp_ns("2009-01-15 08:30:00Z").is_none());
        assert!(parse_timestamp_ns("2009-01-15 08:30:00 ").is_none());
        assert!(parse_timestamp_ns(" 2009-01-15 08:30:00").is_none());
    }

    #[test]
    fn rejects_zero_date_fields() {
        assert!(parse_timestamp_ns("0000-01-15 08:30:00").is_none());
        assert!(parse_timestamp_ns("2009-00-15 08:30:00").is_none());
        assert!(parse_timestamp_ns("2009-01-00 08:30:00").is_none());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(parse_timestamp_ns("2009-13-15 08:30:00").is_none());
        assert!(parse_timestamp_ns("2009-02-30 08:30:00").is_none());
        assert!(parse_timestamp_ns("2009-01-15 24:30:00").is_none());
        assert!(parse_timestamp_ns("2009-01-15 08:61:00").is_none());
    }
}
