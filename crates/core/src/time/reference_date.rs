use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("expected a YYYY-MM-DD date (got {s:?})"))
}

/// Reference date for a report: the explicit `YYYY-MM-DD` argument, or today's UTC date.
///
/// Blank arguments are treated as absent.
pub fn resolve_reference_date(
    date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    match date_arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_date(s),
        None => Ok(now_utc.date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_to_utc_today() {
        // 23:30 UTC is already the next day in most of Asia; the report date stays UTC.
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 23, 30, 0).unwrap();
        let d = resolve_reference_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(resolve_reference_date(Some("  "), now).unwrap(), d);
    }

    #[test]
    fn parses_explicit_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let d = resolve_reference_date(Some("2026-01-15"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn rejects_malformed_dates() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert!(resolve_reference_date(Some("2026-13-01"), now).is_err());
        assert!(resolve_reference_date(Some("01/15/2026"), now).is_err());
        assert!(parse_date("yesterday").is_err());
    }
}
