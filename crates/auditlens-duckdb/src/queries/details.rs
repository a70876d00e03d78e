//! Batch detail listings.
//!
//! Both listings run in two passes: one query for the top-level rows, then
//! exactly one `IN (…)` query per related dimension, joined in memory through
//! a `HashMap` keyed by id. The number of statements is independent of the
//! number of rows.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use duckdb::types::ToSql;
use duckdb::Connection;

use auditlens_core::analytics::{ExpressDetail, UserDetail, DETAIL_LIMIT};
use auditlens_core::period::DateRange;

use crate::backend::window;
use crate::queries::express_checks::{map_check_row, CHECK_COLUMNS};
use crate::queries::placeholders;
use crate::DuckDbBackend;

struct UserRow {
    id: String,
    email: String,
    name: Option<String>,
    phone: Option<String>,
    role: String,
    email_verified_at: Option<String>,
    created_at: String,
}

/// Most recent users registered in the window, with lifetime activity counts.
pub async fn get_users_detail_inner(
    db: &DuckDbBackend,
    range: &DateRange,
) -> Result<Vec<UserDetail>> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;

    let mut stmt = db.prepare(
        &conn,
        r#"
        SELECT
            id, email, name, phone, role,
            CAST(email_verified_at AS VARCHAR),
            CAST(created_at AS VARCHAR)
        FROM users
        WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        ORDER BY created_at DESC, id ASC
        LIMIT ?3
        "#,
    )?;
    let users = stmt
        .query_map(duckdb::params![start, end, DETAIL_LIMIT], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                phone: row.get(3)?,
                role: row.get(4)?,
                email_verified_at: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if users.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
    let checks = counts_by_user(db, &conn, "express_checks", &ids)?;
    let report_orders = counts_by_user(db, &conn, "express_report_orders", &ids)?;
    let audit_orders = counts_by_user(db, &conn, "full_audit_orders", &ids)?;

    Ok(users
        .into_iter()
        .map(|u| UserDetail {
            express_checks: checks.get(&u.id).copied().unwrap_or(0),
            express_report_orders: report_orders.get(&u.id).copied().unwrap_or(0),
            full_audit_orders: audit_orders.get(&u.id).copied().unwrap_or(0),
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            role: u.role,
            email_verified_at: u.email_verified_at,
            created_at: u.created_at,
        })
        .collect())
}

/// Most recent express checks in the window, with the owning user's identity.
pub async fn get_express_detail_inner(
    db: &DuckDbBackend,
    range: &DateRange,
) -> Result<Vec<ExpressDetail>> {
    let (start, end) = window(range);
    let conn = db.conn.lock().await;

    let sql = format!(
        r#"
        SELECT {CHECK_COLUMNS}
        FROM express_checks
        WHERE created_at BETWEEN CAST(?1 AS TIMESTAMP) AND CAST(?2 AS TIMESTAMP)
        ORDER BY created_at DESC, id ASC
        LIMIT ?3
        "#
    );
    let mut stmt = db.prepare(&conn, &sql)?;
    let checks = stmt
        .query_map(duckdb::params![start, end, DETAIL_LIMIT], map_check_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    let user_ids: Vec<String> = checks
        .iter()
        .filter_map(|c| c.user_id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let identities = if user_ids.is_empty() {
        HashMap::new()
    } else {
        identities_by_id(db, &conn, &user_ids)?
    };

    Ok(checks
        .into_iter()
        .map(|check| {
            let identity = check.user_id.as_ref().and_then(|id| identities.get(id));
            ExpressDetail {
                user_name: identity.and_then(|(name, _)| name.clone()),
                user_email: identity.map(|(_, email)| email.clone()),
                check,
            }
        })
        .collect())
}

/// `user_id → row count` in `table`. `table` is spliced into the SQL and is
/// only ever one of the literals above.
fn counts_by_user(
    db: &DuckDbBackend,
    conn: &Connection,
    table: &'static str,
    user_ids: &[String],
) -> Result<HashMap<String, i64>> {
    let sql = format!(
        "SELECT user_id, COUNT(*) FROM {table} WHERE user_id IN ({}) GROUP BY user_id",
        placeholders(user_ids.len())
    );
    let params: Vec<&dyn ToSql> = user_ids.iter().map(|id| id as &dyn ToSql).collect();
    let mut stmt = db.prepare(conn, &sql)?;
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
}

/// `id → (name, email)` for the given users.
fn identities_by_id(
    db: &DuckDbBackend,
    conn: &Connection,
    user_ids: &[String],
) -> Result<HashMap<String, (Option<String>, String)>> {
    let sql = format!(
        "SELECT id, name, email FROM users WHERE id IN ({})",
        placeholders(user_ids.len())
    );
    let params: Vec<&dyn ToSql> = user_ids.iter().map(|id| id as &dyn ToSql).collect();
    let mut stmt = db.prepare(conn, &sql)?;
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((
            row.get::<_, String>(0)?,
            (row.get::<_, Option<String>>(1)?, row.get::<_, String>(2)?),
        ))
    })?;
    Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
}
