use anyhow::Result;

use auditlens_core::analytics::Overview;
use auditlens_core::numeric::{round2, to_count, to_number};
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::DuckDbBackend;

const TOTAL_VISITS_SQL: &str =
    "SELECT COUNT(*) FROM visits WHERE started_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)";
const UNIQUE_VISITORS_SQL: &str =
    "SELECT COUNT(DISTINCT visitor_id) FROM visits WHERE started_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)";
const TOTAL_PAGE_VIEWS_SQL: &str =
    "SELECT COUNT(*) FROM page_views WHERE entered_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)";
// Visits that never reported a duration are excluded, not averaged in as 0.
const AVG_SESSION_DURATION_SQL: &str =
    "SELECT AVG(total_duration_seconds) FROM visits \
     WHERE started_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP) \
       AND total_duration_seconds > 0";
const NEW_USERS_SQL: &str =
    "SELECT COUNT(*) FROM users WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)";
const EXPRESS_CHECKS_SQL: &str =
    "SELECT COUNT(*) FROM express_checks WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)";
const EXPRESS_REPORT_ORDERS_SQL: &str =
    "SELECT COUNT(*) FROM express_report_orders WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)";
const FULL_AUDIT_ORDERS_SQL: &str =
    "SELECT COUNT(*) FROM full_audit_orders WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)";

/// Eight independent reads joined into one response. Any failing read fails
/// the whole overview; a zeroed metric would be indistinguishable from "no
/// activity".
pub async fn get_overview_inner(db: &DuckDbBackend, range: &DateRange) -> Result<Overview> {
    let (
        total_visits,
        unique_visitors,
        total_page_views,
        avg_session_duration,
        new_users,
        express_checks,
        express_report_orders,
        full_audit_orders,
    ) = tokio::try_join!(
        count(db, TOTAL_VISITS_SQL, range),
        count(db, UNIQUE_VISITORS_SQL, range),
        count(db, TOTAL_PAGE_VIEWS_SQL, range),
        average(db, AVG_SESSION_DURATION_SQL, range),
        count(db, NEW_USERS_SQL, range),
        count(db, EXPRESS_CHECKS_SQL, range),
        count(db, EXPRESS_REPORT_ORDERS_SQL, range),
        count(db, FULL_AUDIT_ORDERS_SQL, range),
    )?;

    Ok(Overview {
        total_visits,
        unique_visitors,
        total_page_views,
        avg_session_duration: round2(avg_session_duration),
        new_users,
        express_checks,
        express_report_orders,
        full_audit_orders,
    })
}

async fn count(db: &DuckDbBackend, sql: &str, range: &DateRange) -> Result<i64> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(&conn, sql)?;
    let value: Option<i64> = stmt.query_row(duckdb::params![start, end], |row| row.get(0))?;
    Ok(to_count(value))
}

async fn average(db: &DuckDbBackend, sql: &str, range: &DateRange) -> Result<f64> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(&conn, sql)?;
    let value: Option<f64> = stmt.query_row(duckdb::params![start, end], |row| row.get(0))?;
    Ok(to_number(value))
}
