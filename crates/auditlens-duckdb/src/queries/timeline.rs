use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use auditlens_core::analytics::{CheckBucket, Granularity, Timeline, VisitBucket};
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::DuckDbBackend;

const VISITS_SQL: &str = r#"
    SELECT
        CAST(date_trunc(?3, (started_at AT TIME ZONE 'UTC') AT TIME ZONE ?4) AS VARCHAR) AS bucket,
        COUNT(*) AS visits,
        COUNT(DISTINCT visitor_id) AS unique_visitors
    FROM visits
    WHERE started_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
    GROUP BY bucket
    ORDER BY bucket
"#;

const CHECKS_SQL: &str = r#"
    SELECT
        CAST(date_trunc(?3, (created_at AT TIME ZONE 'UTC') AT TIME ZONE ?4) AS VARCHAR) AS bucket,
        COUNT(*) AS checks
    FROM express_checks
    WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
    GROUP BY bucket
    ORDER BY bucket
"#;

/// Visits and express checks bucketed independently by `granularity`.
///
/// The series are sparse: buckets without rows are not emitted. Stored UTC
/// timestamps are shifted into `tz` before truncation, so a day bucket is
/// the same calendar day the window was resolved in. `week` truncates to the
/// ISO Monday and is labelled with the ISO year-week.
pub async fn get_timeline_inner(
    db: &DuckDbBackend,
    range: &DateRange,
    granularity: Granularity,
    tz: Tz,
) -> Result<Timeline> {
    let (start, end) = window(range);
    let unit = granularity.trunc_unit();
    let zone = tz.name();
    let conn = db.conn.lock().await;

    let mut stmt = db.prepare(&conn, VISITS_SQL)?;
    let rows = stmt.query_map(duckdb::params![start, end, unit, zone], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;
    let mut visits = Vec::new();
    for row in rows {
        let (bucket, count, unique_visitors) = row?;
        visits.push(VisitBucket {
            bucket: granularity.label(parse_bucket(&bucket)?),
            visits: count,
            unique_visitors,
        });
    }

    let mut stmt = db.prepare(&conn, CHECKS_SQL)?;
    let rows = stmt.query_map(duckdb::params![start, end, unit, zone], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut express_checks = Vec::new();
    for row in rows {
        let (bucket, checks) = row?;
        express_checks.push(CheckBucket {
            bucket: granularity.label(parse_bucket(&bucket)?),
            checks,
        });
    }

    Ok(Timeline {
        granularity,
        visits,
        express_checks,
    })
}

/// DuckDB renders a truncated `TIMESTAMP` as `YYYY-MM-DD HH:MM:SS`; a `DATE`
/// result renders without the time part.
fn parse_bucket(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(at);
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")?;
    Ok(day.and_time(chrono::NaiveTime::MIN))
}
