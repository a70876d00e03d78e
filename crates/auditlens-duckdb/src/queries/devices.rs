use anyhow::Result;

use auditlens_core::analytics::{Breakdown, BreakdownRow, Devices};
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::DuckDbBackend;

pub async fn get_devices_inner(db: &DuckDbBackend, range: &DateRange) -> Result<Devices> {
    let (devices, browsers, operating_systems) = tokio::try_join!(
        breakdown(db, range, Breakdown::DeviceType),
        breakdown(db, range, Breakdown::Browser),
        breakdown(db, range, Breakdown::Os),
    )?;
    Ok(Devices {
        devices,
        browsers,
        operating_systems,
    })
}

/// Visits grouped by one client dimension. Rows with no value are reported
/// under `unknown`.
async fn breakdown(
    db: &DuckDbBackend,
    range: &DateRange,
    dimension: Breakdown,
) -> Result<Vec<BreakdownRow>> {
    let (start, end) = window(range);
    let column = dimension.column();
    let limit_sql = dimension
        .limit()
        .map(|n| format!("LIMIT {n}"))
        .unwrap_or_default();

    let sql = format!(
        r#"
        SELECT
            COALESCE({column}, 'unknown') AS value,
            COUNT(*) AS visits,
            COUNT(DISTINCT visitor_id) AS unique_visitors
        FROM visits
        WHERE started_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        GROUP BY value
        ORDER BY visits DESC, value ASC
        {limit_sql}
        "#
    );

    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(&conn, &sql)?;
    let rows = stmt.query_map(duckdb::params![start, end], |row| {
        Ok(BreakdownRow {
            value: row.get(0)?,
            count: row.get(1)?,
            unique_visitors: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
