//! Event ingest: validation and record assembly for the track endpoints.
//!
//! Each entry point validates its payload before touching storage, so a
//! rejected call performs no write. Network metadata comes exclusively from
//! the server-built [`ClientContext`]; the principal is passed in explicitly.

use chrono::{DateTime, Utc};

use crate::analytics::AnalyticsBackend;
use crate::error::IngestError;
use crate::event::{
    BeginVisit, ClosePageView, CloseVisit, NewExpressCheck, NewPageView, NewVisit, PageViewExit,
    RecordExpressCheck, RecordPageView, VisitEnd,
};
use crate::principal::Principal;
use crate::visitor::{normalize_website_url, ClientContext};

/// Start a visit. Returns the new visit id.
pub async fn begin_visit(
    backend: &dyn AnalyticsBackend,
    principal: &Principal,
    client: &ClientContext,
    payload: BeginVisit,
    now: DateTime<Utc>,
) -> Result<String, IngestError> {
    let visitor_id = required(payload.visitor_id, "visitorId")?;
    let session_id = required(payload.session_id, "sessionId")?;

    let visit = NewVisit {
        id: uuid::Uuid::new_v4().to_string(),
        visitor_id,
        session_id,
        user_id: principal.user_id.clone(),
        ip_address: client.ip_address.clone(),
        user_agent: client.user_agent.clone(),
        referrer: optional(payload.referrer),
        utm_source: optional(payload.utm_source),
        utm_medium: optional(payload.utm_medium),
        utm_campaign: optional(payload.utm_campaign),
        // Client hints win; the server-side UA parse fills the gaps.
        device_type: optional(payload.device_type).or_else(|| client.device_type.clone()),
        browser: optional(payload.browser).or_else(|| client.browser.clone()),
        os: optional(payload.os).or_else(|| client.os.clone()),
        country: client.country.clone(),
        city: client.city.clone(),
        started_at: now,
    };

    backend.insert_visit(&visit).await?;
    Ok(visit.id)
}

/// Record a page view. Returns the new page view id.
///
/// A page view may arrive without a visit (the begin-visit call was lost);
/// when it does name one, that visit must exist.
pub async fn record_page_view(
    backend: &dyn AnalyticsBackend,
    principal: &Principal,
    payload: RecordPageView,
    now: DateTime<Utc>,
) -> Result<String, IngestError> {
    let visitor_id = required(payload.visitor_id, "visitorId")?;
    let session_id = required(payload.session_id, "sessionId")?;
    let page_path = required(payload.page_path, "pagePath")?;
    let visit_id = optional(payload.visit_id);

    let page_view = NewPageView {
        id: uuid::Uuid::new_v4().to_string(),
        visit_id: visit_id.clone(),
        visitor_id,
        session_id,
        user_id: principal.user_id.clone(),
        page_path,
        page_title: optional(payload.page_title),
        referrer_path: optional(payload.referrer_path),
        entered_at: now,
    };

    if !backend.insert_page_view(&page_view).await? {
        return Err(IngestError::NotFound(format!(
            "visit {} does not exist",
            visit_id.unwrap_or_default()
        )));
    }
    Ok(page_view.id)
}

/// Record a completed express check. Returns the new check id.
pub async fn record_express_check(
    backend: &dyn AnalyticsBackend,
    principal: &Principal,
    client: &ClientContext,
    payload: RecordExpressCheck,
    now: DateTime<Utc>,
) -> Result<String, IngestError> {
    let website_url = required(payload.website_url, "websiteUrl")?;

    let check = NewExpressCheck {
        id: uuid::Uuid::new_v4().to_string(),
        visitor_id: optional(payload.visitor_id),
        session_id: optional(payload.session_id),
        user_id: principal.user_id.clone(),
        normalized_url: normalize_website_url(&website_url),
        website_url,
        company_name: optional(payload.company_name),
        email: optional(payload.email),
        phone: optional(payload.phone),
        tax_id: optional(payload.tax_id),
        score_percent: payload
            .score_percent
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(0.0, 100.0)),
        severity: optional(payload.severity),
        result_payload: payload.result.map(|v| v.to_string()),
        ip_address: client.ip_address.clone(),
        user_agent: client.user_agent.clone(),
        conversion_type: optional(payload.conversion_type).unwrap_or_else(|| "none".to_string()),
        created_at: now,
    };

    backend.insert_express_check(&check).await?;
    Ok(check.id)
}

/// Close a page view. Missing metrics are recorded as 0; repeating the call
/// overwrites the earlier values.
pub async fn close_page_view(
    backend: &dyn AnalyticsBackend,
    page_view_id: &str,
    payload: ClosePageView,
    now: DateTime<Utc>,
) -> Result<(), IngestError> {
    let exit = PageViewExit {
        exited_at: now,
        duration_seconds: whole_non_negative(payload.duration_seconds),
        scroll_depth_percent: whole_non_negative(payload.scroll_depth_percent).min(100),
    };
    if !backend.close_page_view(page_view_id, &exit).await? {
        return Err(IngestError::NotFound(format!(
            "page view {page_view_id} does not exist"
        )));
    }
    Ok(())
}

/// Close a visit. Repeating the call overwrites, it never accumulates.
pub async fn close_visit(
    backend: &dyn AnalyticsBackend,
    visit_id: &str,
    payload: CloseVisit,
    now: DateTime<Utc>,
) -> Result<(), IngestError> {
    let end = VisitEnd {
        ended_at: now,
        total_duration_seconds: whole_non_negative(payload.total_duration_seconds),
    };
    if !backend.close_visit(visit_id, &end).await? {
        return Err(IngestError::NotFound(format!("visit {visit_id} does not exist")));
    }
    Ok(())
}

fn required(value: Option<String>, field: &str) -> Result<String, IngestError> {
    optional(value).ok_or_else(|| IngestError::missing(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Absent, negative or non-finite → 0; values beyond `i64` saturate.
fn whole_non_negative(value: Option<f64>) -> i64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as i64)
        .unwrap_or(0)
}
