use anyhow::Result;

use auditlens_core::analytics::{
    ExpressCheckRow, ExpressChecksPage, WebsiteRollup, TOP_WEBSITES_LIMIT,
};
use auditlens_core::numeric::{round2, to_number};
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::DuckDbBackend;

/// Column list matching [`map_check_row`].
pub(crate) const CHECK_COLUMNS: &str = "id, visitor_id, user_id, website_url, normalized_url, \
     company_name, email, phone, tax_id, score_percent, severity, conversion_type, \
     ip_address, CAST(created_at AS VARCHAR)";

pub(crate) fn map_check_row(row: &duckdb::Row<'_>) -> duckdb::Result<ExpressCheckRow> {
    Ok(ExpressCheckRow {
        id: row.get(0)?,
        visitor_id: row.get(1)?,
        user_id: row.get(2)?,
        website_url: row.get(3)?,
        normalized_url: row.get(4)?,
        company_name: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
        tax_id: row.get(8)?,
        score_percent: row.get(9)?,
        severity: row.get(10)?,
        conversion_type: row.get(11)?,
        ip_address: row.get(12)?,
        created_at: row.get(13)?,
    })
}

/// One page of raw checks (newest first), the in-window total, and the
/// busiest websites by normalized URL.
pub async fn get_express_checks_inner(
    db: &DuckDbBackend,
    range: &DateRange,
    limit: i64,
    offset: i64,
) -> Result<ExpressChecksPage> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;

    let list_sql = format!(
        r#"
        SELECT {CHECK_COLUMNS}
        FROM express_checks
        WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        ORDER BY created_at DESC, id ASC
        LIMIT ?3 OFFSET ?4
        "#
    );
    let mut stmt = db.prepare(&conn, &list_sql)?;
    let checks = stmt
        .query_map(duckdb::params![start, end, limit, offset], map_check_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = db.prepare(
        &conn,
        "SELECT COUNT(*) FROM express_checks \
         WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)",
    )?;
    let total: i64 = stmt.query_row(duckdb::params![start, end], |row| row.get(0))?;

    let mut stmt = db.prepare(
        &conn,
        r#"
        SELECT
            normalized_url,
            COUNT(*) AS checks,
            AVG(score_percent) AS avg_score
        FROM express_checks
        WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        GROUP BY normalized_url
        ORDER BY checks DESC, normalized_url ASC
        LIMIT ?3
        "#,
    )?;
    let top_websites = stmt
        .query_map(duckdb::params![start, end, TOP_WEBSITES_LIMIT], |row| {
            Ok(WebsiteRollup {
                normalized_url: row.get(0)?,
                checks: row.get(1)?,
                avg_score: round2(to_number(row.get(2)?)),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExpressChecksPage {
        checks,
        top_websites,
        total,
        limit,
        offset,
    })
}
