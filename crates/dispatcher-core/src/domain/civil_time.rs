//! Civil time - 固定オフセットの時刻表現
//!
//! Records carry timestamps as `YYYY-MM-DD HH:MM:SS` strings in one fixed
//! offset. Everything else works on `DateTime<Utc>` and converts here.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Format used for `assigned_time` / `finished_time`.
pub const CIVIL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an offset such as `+08:00`, `-05:30` or `Z`.
pub fn parse_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    s.parse::<FixedOffset>().ok()
}

/// Instant -> civil string (second precision).
pub fn format_civil(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(CIVIL_TIME_FORMAT).to_string()
}

/// Civil string -> instant. Empty or malformed input yields `None`.
pub fn parse_civil(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(s, CIVIL_TIME_FORMAT).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cst() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn formats_in_fixed_offset() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 20, 30, 5).unwrap();
        assert_eq!(format_civil(at, cst()), "2024-01-02 04:30:05");
    }

    #[test]
    fn parse_is_inverse_of_format() {
        let at = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
        let s = format_civil(at, cst());
        assert_eq!(parse_civil(&s, cst()), Some(at));
    }

    #[rstest]
    #[case::empty("")]
    #[case::garbage("yesterday")]
    #[case::iso_with_t("2024-01-01T10:00:00")]
    #[case::out_of_range("2024-13-40 10:00:00")]
    fn malformed_civil_time_is_none(#[case] input: &str) {
        assert_eq!(parse_civil(input, cst()), None);
    }

    #[rstest]
    #[case::east("+08:00", 8 * 3600)]
    #[case::west("-05:30", -(5 * 3600 + 30 * 60))]
    #[case::zulu("Z", 0)]
    fn parses_offsets(#[case] input: &str, #[case] seconds: i32) {
        assert_eq!(parse_offset(input).unwrap().local_minus_utc(), seconds);
    }

    #[test]
    fn rejects_bad_offset() {
        assert!(parse_offset("eight").is_none());
    }
}
