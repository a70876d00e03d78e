use anyhow::Result;

use auditlens_core::analytics::VisitorRollup;
use auditlens_core::numeric::to_count;
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::DuckDbBackend;

/// Visits rolled up per visitor and client profile, most recently active
/// first.
pub async fn get_visitor_rollup_inner(
    db: &DuckDbBackend,
    range: &DateRange,
    limit: i64,
    offset: i64,
) -> Result<Vec<VisitorRollup>> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(
        &conn,
        r#"
        SELECT
            visitor_id,
            user_id,
            device_type,
            browser,
            os,
            country,
            city,
            COUNT(*) AS sessions,
            CAST(SUM(page_count) AS BIGINT) AS page_views,
            CAST(SUM(total_duration_seconds) AS BIGINT) AS total_duration,
            CAST(MIN(started_at) AS VARCHAR) AS first_visit,
            CAST(MAX(started_at) AS VARCHAR) AS last_visit
        FROM visits
        WHERE started_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        GROUP BY visitor_id, user_id, device_type, browser, os, country, city
        ORDER BY MAX(started_at) DESC, visitor_id ASC
        LIMIT ?3 OFFSET ?4
        "#,
    )?;

    let rows = stmt.query_map(duckdb::params![start, end, limit, offset], |row| {
        Ok(VisitorRollup {
            visitor_id: row.get(0)?,
            user_id: row.get(1)?,
            device_type: row.get(2)?,
            browser: row.get(3)?,
            os: row.get(4)?,
            country: row.get(5)?,
            city: row.get(6)?,
            sessions: row.get(7)?,
            page_views: to_count(row.get(8)?),
            total_duration: to_count(row.get(9)?),
            first_visit: row.get(10)?,
            last_visit: row.get(11)?,
        })
    })?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
