use chrono::{DateTime, Utc};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Wire payloads (POST /api/analytics/track/*)
// ---------------------------------------------------------------------------
//
// Required fields are modelled as `Option` so that a missing field surfaces as
// a validation error from `ingest` rather than a body-rejection from serde.
// Unknown fields (including any client-sent IP or user agent) are ignored.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginVisit {
    pub visitor_id: Option<String>,
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPageView {
    pub visit_id: Option<String>,
    pub visitor_id: Option<String>,
    pub session_id: Option<String>,
    pub page_path: Option<String>,
    pub page_title: Option<String>,
    pub referrer_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePageView {
    pub duration_seconds: Option<f64>,
    pub scroll_depth_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseVisit {
    pub total_duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordExpressCheck {
    pub website_url: Option<String>,
    pub visitor_id: Option<String>,
    pub session_id: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub score_percent: Option<f64>,
    pub severity: Option<String>,
    /// Raw scan result, stored verbatim as JSON text.
    pub result: Option<serde_json::Value>,
    pub conversion_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Storage records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewVisit {
    pub id: String,
    pub visitor_id: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPageView {
    pub id: String,
    pub visit_id: Option<String>,
    pub visitor_id: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub page_path: String,
    pub page_title: Option<String>,
    pub referrer_path: Option<String>,
    pub entered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpressCheck {
    pub id: String,
    pub visitor_id: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub website_url: String,
    pub normalized_url: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub score_percent: Option<f64>,
    pub severity: Option<String>,
    pub result_payload: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub conversion_type: String,
    pub created_at: DateTime<Utc>,
}

/// Values written when a page view is closed. Overwrites any earlier close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewExit {
    pub exited_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub scroll_depth_percent: i64,
}

/// Values written when a visit is closed. Overwrites any earlier close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitEnd {
    pub ended_at: DateTime<Utc>,
    pub total_duration_seconds: i64,
}
