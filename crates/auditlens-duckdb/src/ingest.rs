//! Visit / page-view correlation writes.
//!
//! Every write targets one row, or one row plus one atomic counter update in
//! the same transaction. Nothing here reads a value back to compute the next
//! one: `page_count` is only ever bumped server-side with `page_count + 1`.

use anyhow::Result;
use tracing::debug;

use auditlens_core::event::{NewExpressCheck, NewPageView, NewVisit, PageViewExit, VisitEnd};

use crate::backend::ts;
use crate::DuckDbBackend;

impl DuckDbBackend {
    pub async fn insert_visit(&self, visit: &NewVisit) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO visits (
                id, visitor_id, session_id, user_id,
                ip_address, user_agent, referrer,
                utm_source, utm_medium, utm_campaign,
                device_type, browser, os, country, city,
                started_at, ended_at, page_count, total_duration_seconds
            ) VALUES (
                ?1,  ?2,  ?3,  ?4,
                ?5,  ?6,  ?7,
                ?8,  ?9,  ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, NULL, 0, 0
            )"#,
            duckdb::params![
                visit.id,
                visit.visitor_id,
                visit.session_id,
                visit.user_id,
                visit.ip_address,
                visit.user_agent,
                visit.referrer,
                visit.utm_source,
                visit.utm_medium,
                visit.utm_campaign,
                visit.device_type,
                visit.browser,
                visit.os,
                visit.country,
                visit.city,
                ts(&visit.started_at),
            ],
        )?;
        debug!(visit_id = %visit.id, visitor_id = %visit.visitor_id, "visit started");
        Ok(())
    }

    /// Insert a page view, bumping its visit's `page_count` in the same
    /// transaction. Returns `false` (and writes nothing) when the named visit
    /// does not exist.
    pub async fn insert_page_view(&self, page_view: &NewPageView) -> Result<bool> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        if let Some(visit_id) = &page_view.visit_id {
            let updated = tx.execute(
                "UPDATE visits SET page_count = page_count + 1 WHERE id = ?1",
                duckdb::params![visit_id],
            )?;
            if updated == 0 {
                // Dropping the transaction rolls it back.
                return Ok(false);
            }
        }

        tx.execute(
            r#"INSERT INTO page_views (
                id, visit_id, visitor_id, session_id, user_id,
                page_path, page_title, referrer_path,
                entered_at, exited_at, duration_seconds, scroll_depth_percent
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, NULL, 0, 0
            )"#,
            duckdb::params![
                page_view.id,
                page_view.visit_id,
                page_view.visitor_id,
                page_view.session_id,
                page_view.user_id,
                page_view.page_path,
                page_view.page_title,
                page_view.referrer_path,
                ts(&page_view.entered_at),
            ],
        )?;

        tx.commit()?;
        Ok(true)
    }

    pub async fn insert_express_check(&self, check: &NewExpressCheck) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO express_checks (
                id, visitor_id, session_id, user_id,
                website_url, normalized_url,
                company_name, email, phone, tax_id,
                score_percent, severity, result_payload,
                ip_address, user_agent, conversion_type, created_at
            ) VALUES (
                ?1,  ?2,  ?3,  ?4,
                ?5,  ?6,
                ?7,  ?8,  ?9,  ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16, ?17
            )"#,
            duckdb::params![
                check.id,
                check.visitor_id,
                check.session_id,
                check.user_id,
                check.website_url,
                check.normalized_url,
                check.company_name,
                check.email,
                check.phone,
                check.tax_id,
                check.score_percent,
                check.severity,
                check.result_payload,
                check.ip_address,
                check.user_agent,
                check.conversion_type,
                ts(&check.created_at),
            ],
        )?;
        Ok(())
    }

    /// Overwrite the exit metrics of a page view. Returns `false` if the id is
    /// unknown.
    pub async fn close_page_view(&self, id: &str, exit: &PageViewExit) -> Result<bool> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE page_views
             SET exited_at = ?1, duration_seconds = ?2, scroll_depth_percent = ?3
             WHERE id = ?4",
            duckdb::params![
                ts(&exit.exited_at),
                exit.duration_seconds,
                exit.scroll_depth_percent,
                id
            ],
        )?;
        Ok(updated > 0)
    }

    /// Overwrite the end of a visit. Returns `false` if the id is unknown.
    pub async fn close_visit(&self, id: &str, end: &VisitEnd) -> Result<bool> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE visits SET ended_at = ?1, total_duration_seconds = ?2 WHERE id = ?3",
            duckdb::params![ts(&end.ended_at), end.total_duration_seconds, id],
        )?;
        Ok(updated > 0)
    }
}
