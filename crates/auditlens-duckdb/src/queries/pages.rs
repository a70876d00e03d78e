use anyhow::Result;

use auditlens_core::analytics::PageStat;
use auditlens_core::numeric::{round2, to_number};
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::DuckDbBackend;

/// Page views grouped by path, busiest first.
pub async fn get_page_stats_inner(
    db: &DuckDbBackend,
    range: &DateRange,
    limit: i64,
) -> Result<Vec<PageStat>> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(
        &conn,
        r#"
        SELECT
            page_path,
            COUNT(*) AS views,
            COUNT(DISTINCT visitor_id) AS unique_visitors,
            AVG(duration_seconds) AS avg_duration,
            AVG(scroll_depth_percent) AS avg_scroll_depth
        FROM page_views
        WHERE entered_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        GROUP BY page_path
        ORDER BY views DESC, page_path ASC
        LIMIT ?3
        "#,
    )?;

    let rows = stmt.query_map(duckdb::params![start, end, limit], |row| {
        Ok(PageStat {
            page_path: row.get(0)?,
            views: row.get(1)?,
            unique_visitors: row.get(2)?,
            avg_duration: round2(to_number(row.get(3)?)),
            avg_scroll_depth: round2(to_number(row.get(4)?)),
        })
    })?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
