//! Date-range resolution for analytics queries.
//!
//! Turns `{startDate, endDate, period}` into a concrete `[start, end]` pair of
//! UTC instants. Calendar days are taken in the configured reporting zone, so
//! "today" ends at 23:59:59.999 local time rather than UTC midnight.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// Named lookback windows. Anything unrecognised resolves to `Week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("day") => Self::Day,
            Some("month") => Self::Month,
            Some("year") => Self::Year,
            _ => Self::Week,
        }
    }
}

/// Range parameters as accepted on every read endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
}

/// A resolved window. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Resolve `params` against a fixed `now`.
///
/// Explicit dates win only when both are present; otherwise the named period
/// applies. Never touches the clock itself.
pub fn resolve_range(
    params: &RangeParams,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<DateRange, RangeError> {
    let start_raw = non_blank(params.start_date.as_deref());
    let end_raw = non_blank(params.end_date.as_deref());

    if let (Some(start_raw), Some(end_raw)) = (start_raw, end_raw) {
        let start_day = parse_day(start_raw, "startDate")?;
        let end_day = parse_day(end_raw, "endDate")?;
        if end_day < start_day {
            return Err(RangeError::Reversed);
        }
        return Ok(DateRange {
            start: start_of_day(tz, start_day),
            end: end_of_day(tz, end_day),
        });
    }

    let today = now.with_timezone(&tz).date_naive();
    let first_day = match Period::parse(params.period.as_deref()) {
        Period::Day => today,
        Period::Week => today - Duration::days(7),
        Period::Month => today
            .checked_sub_months(Months::new(1))
            .unwrap_or(today - Duration::days(30)),
        Period::Year => today
            .checked_sub_months(Months::new(12))
            .unwrap_or(today - Duration::days(365)),
    };

    Ok(DateRange {
        start: start_of_day(tz, first_day),
        end: end_of_day(tz, today),
    })
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_day(raw: &str, field: &'static str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| RangeError::InvalidDate { field })
}

fn start_of_day(tz: Tz, day: NaiveDate) -> DateTime<Utc> {
    local_instant(tz, day.and_time(NaiveTime::MIN))
}

fn end_of_day(tz: Tz, day: NaiveDate) -> DateTime<Utc> {
    start_of_day(tz, day + Duration::days(1)) - Duration::milliseconds(1)
}

/// Map a local wall-clock time to UTC. Ambiguous times take the earlier
/// instant; times inside a DST gap move forward to the end of the gap.
fn local_instant(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    for shift in 0..=3 {
        if let Some(dt) = tz
            .from_local_datetime(&(naive + Duration::hours(shift)))
            .earliest()
        {
            return dt.with_timezone(&Utc);
        }
    }
    naive.and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 31, 14, 30, 0).single().unwrap_or_default()
    }

    fn params(period: Option<&str>) -> RangeParams {
        RangeParams {
            start_date: None,
            end_date: None,
            period: period.map(str::to_string),
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).single().unwrap_or_default()
    }

    #[test]
    fn day_starts_at_local_midnight() {
        let r = resolve_range(&params(Some("day")), now(), Tz::UTC).expect("range");
        assert_eq!(r.start, utc(2026, 3, 31, 0, 0, 0));
        assert_eq!(r.end, utc(2026, 3, 31, 23, 59, 59) + Duration::milliseconds(999));
    }

    #[test]
    fn week_is_seven_days_back_floored() {
        let r = resolve_range(&params(Some("week")), now(), Tz::UTC).expect("range");
        assert_eq!(r.start, utc(2026, 3, 24, 0, 0, 0));
    }

    #[test]
    fn month_clamps_to_last_day_of_shorter_month() {
        let r = resolve_range(&params(Some("month")), now(), Tz::UTC).expect("range");
        assert_eq!(r.start, utc(2026, 2, 28, 0, 0, 0));
    }

    #[test]
    fn year_goes_back_one_calendar_year() {
        let r = resolve_range(&params(Some("year")), now(), Tz::UTC).expect("range");
        assert_eq!(r.start, utc(2025, 3, 31, 0, 0, 0));
    }

    #[test]
    fn omitted_and_unknown_period_match_week() {
        let week = resolve_range(&params(Some("week")), now(), Tz::UTC).expect("range");
        let omitted = resolve_range(&params(None), now(), Tz::UTC).expect("range");
        let typo = resolve_range(&params(Some("weak")), now(), Tz::UTC).expect("range");
        assert_eq!(week, omitted);
        assert_eq!(week, typo);
    }

    #[test]
    fn period_ranges_are_ordered_and_bounded() {
        for (p, days) in [("day", 1), ("week", 8), ("month", 32), ("year", 367)] {
            let r = resolve_range(&params(Some(p)), now(), Tz::UTC).expect("range");
            assert!(r.end >= r.start, "{p}: end before start");
            assert!(r.start <= now(), "{p}: start after now");
            assert!(r.end >= now(), "{p}: end before now");
            assert!(r.start >= now() - Duration::days(days), "{p}: start too early");
        }
    }

    #[test]
    fn explicit_dates_cover_whole_days() {
        let p = RangeParams {
            start_date: Some("2026-01-01".to_string()),
            end_date: Some("2026-01-15".to_string()),
            period: Some("year".to_string()),
        };
        let r = resolve_range(&p, now(), Tz::UTC).expect("range");
        assert_eq!(r.start, utc(2026, 1, 1, 0, 0, 0));
        assert_eq!(r.end, utc(2026, 1, 15, 23, 59, 59) + Duration::milliseconds(999));
    }

    #[test]
    fn explicit_dates_use_reporting_zone() {
        let p = RangeParams {
            start_date: Some("2026-01-10".to_string()),
            end_date: Some("2026-01-10".to_string()),
            period: None,
        };
        let r = resolve_range(&p, now(), chrono_tz::Europe::Warsaw).expect("range");
        assert_eq!(r.start, utc(2026, 1, 9, 23, 0, 0));
        assert_eq!(r.end, utc(2026, 1, 10, 22, 59, 59) + Duration::milliseconds(999));
    }

    #[test]
    fn single_explicit_date_falls_back_to_period() {
        let p = RangeParams {
            start_date: Some("2026-01-01".to_string()),
            end_date: None,
            period: Some("day".to_string()),
        };
        let r = resolve_range(&p, now(), Tz::UTC).expect("range");
        assert_eq!(r.start, utc(2026, 3, 31, 0, 0, 0));
    }

    #[test]
    fn malformed_or_reversed_dates_are_rejected() {
        let bad = RangeParams {
            start_date: Some("01/02/2026".to_string()),
            end_date: Some("2026-01-15".to_string()),
            period: None,
        };
        assert_eq!(
            resolve_range(&bad, now(), Tz::UTC),
            Err(RangeError::InvalidDate { field: "startDate" })
        );

        let reversed = RangeParams {
            start_date: Some("2026-02-01".to_string()),
            end_date: Some("2026-01-15".to_string()),
            period: None,
        };
        assert_eq!(resolve_range(&reversed, now(), Tz::UTC), Err(RangeError::Reversed));
    }
}
