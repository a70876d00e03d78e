use anyhow::Result;

use auditlens_core::analytics::{AuditOrderStatus, Conversions, PaymentStatus, ReportOrderStatus};
use auditlens_core::numeric::to_number;
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::DuckDbBackend;

/// Three independent `GROUP BY status` rollups over the order facts.
pub async fn get_conversions_inner(db: &DuckDbBackend, range: &DateRange) -> Result<Conversions> {
    let (express_report_orders, full_audit_orders, payments) = tokio::try_join!(
        report_orders(db, range),
        audit_orders(db, range),
        succeeded_payments(db, range),
    )?;
    Ok(Conversions {
        express_report_orders,
        full_audit_orders,
        payments,
    })
}

async fn report_orders(db: &DuckDbBackend, range: &DateRange) -> Result<Vec<ReportOrderStatus>> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(
        &conn,
        r#"
        SELECT status, COUNT(*) AS orders, CAST(SUM(price) AS DOUBLE) AS revenue
        FROM express_report_orders
        WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        GROUP BY status
        ORDER BY orders DESC, status ASC
        "#,
    )?;
    let rows = stmt.query_map(duckdb::params![start, end], |row| {
        Ok(ReportOrderStatus {
            status: row.get(0)?,
            count: row.get(1)?,
            revenue: to_number(row.get(2)?),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

async fn audit_orders(db: &DuckDbBackend, range: &DateRange) -> Result<Vec<AuditOrderStatus>> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(
        &conn,
        r#"
        SELECT status, COUNT(*) AS orders
        FROM full_audit_orders
        WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        GROUP BY status
        ORDER BY orders DESC, status ASC
        "#,
    )?;
    let rows = stmt.query_map(duckdb::params![start, end], |row| {
        Ok(AuditOrderStatus {
            status: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

async fn succeeded_payments(db: &DuckDbBackend, range: &DateRange) -> Result<Vec<PaymentStatus>> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;
    let mut stmt = db.prepare(
        &conn,
        r#"
        SELECT status, COUNT(*) AS payments, CAST(SUM(amount) AS DOUBLE) AS amount
        FROM payments
        WHERE status = 'succeeded'
          AND created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        GROUP BY status
        "#,
    )?;
    let rows = stmt.query_map(duckdb::params![start, end], |row| {
        Ok(PaymentStatus {
            status: row.get(0)?,
            count: row.get(1)?,
            amount: to_number(row.get(2)?),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
