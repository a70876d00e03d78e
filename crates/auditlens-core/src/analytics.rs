//! Analytics backend abstraction.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime};
use chrono_tz::Tz;
use serde::Serialize;

use crate::event::{NewExpressCheck, NewPageView, NewVisit, PageViewExit, VisitEnd};
use crate::period::DateRange;

/// Row cap for the batch detail listings.
pub const DETAIL_LIMIT: i64 = 500;
/// Row cap for the per-website express-check rollup.
pub const TOP_WEBSITES_LIMIT: i64 = 20;

/// Time-series bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Unknown values resolve to `Day`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("hour") => Self::Hour,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            _ => Self::Day,
        }
    }

    /// `date_trunc` unit. Week truncation lands on the ISO Monday.
    pub const fn trunc_unit(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Display key for a truncated bucket start.
    pub fn label(self, bucket_start: NaiveDateTime) -> String {
        match self {
            Self::Hour => bucket_start.format("%Y-%m-%d %H:00").to_string(),
            Self::Day => bucket_start.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let week = bucket_start.date().iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Month => bucket_start.format("%Y-%m").to_string(),
        }
    }
}

/// Visit dimensions available to the device breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    DeviceType,
    Browser,
    Os,
}

impl Breakdown {
    pub const fn column(self) -> &'static str {
        match self {
            Self::DeviceType => "device_type",
            Self::Browser => "browser",
            Self::Os => "os",
        }
    }

    /// `None` means every group is returned.
    pub const fn limit(self) -> Option<i64> {
        match self {
            Self::DeviceType => None,
            Self::Browser | Self::Os => Some(10),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_visits: i64,
    pub unique_visitors: i64,
    pub total_page_views: i64,
    /// Mean of `total_duration_seconds` over visits that reported a duration.
    pub avg_session_duration: f64,
    pub new_users: i64,
    pub express_checks: i64,
    pub express_report_orders: i64,
    pub full_audit_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStat {
    pub page_path: String,
    pub views: i64,
    pub unique_visitors: i64,
    pub avg_duration: f64,
    pub avg_scroll_depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRollup {
    pub visitor_id: String,
    pub user_id: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub sessions: i64,
    pub page_views: i64,
    pub total_duration: i64,
    pub first_visit: String,
    pub last_visit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressCheckRow {
    pub id: String,
    pub visitor_id: Option<String>,
    pub user_id: Option<String>,
    pub website_url: String,
    pub normalized_url: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub score_percent: Option<f64>,
    pub severity: Option<String>,
    pub conversion_type: String,
    pub ip_address: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteRollup {
    pub normalized_url: String,
    pub checks: i64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressChecksPage {
    pub checks: Vec<ExpressCheckRow>,
    pub top_websites: Vec<WebsiteRollup>,
    /// Checks in the window, independent of `limit`/`offset`.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOrderStatus {
    pub status: String,
    pub count: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOrderStatus {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub status: String,
    pub count: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversions {
    pub express_report_orders: Vec<ReportOrderStatus>,
    pub full_audit_orders: Vec<AuditOrderStatus>,
    pub payments: Vec<PaymentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitBucket {
    pub bucket: String,
    pub visits: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBucket {
    pub bucket: String,
    pub checks: i64,
}

/// Sparse series: buckets without activity are absent, not zero-filled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub granularity: Granularity,
    pub visits: Vec<VisitBucket>,
    pub express_checks: Vec<CheckBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
    pub value: String,
    pub count: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Devices {
    pub devices: Vec<BreakdownRow>,
    pub browsers: Vec<BreakdownRow>,
    pub operating_systems: Vec<BreakdownRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub email_verified_at: Option<String>,
    pub created_at: String,
    pub express_checks: i64,
    pub express_report_orders: i64,
    pub full_audit_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressDetail {
    #[serde(flatten)]
    pub check: ExpressCheckRow,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Storage seam for ingest writes and windowed aggregate reads.
///
/// Every read takes an already-resolved [`DateRange`]; both bounds inclusive.
/// A failure in any read fails the whole call. No method retries.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync + 'static {
    async fn insert_visit(&self, visit: &NewVisit) -> anyhow::Result<()>;

    /// Insert a page view and, when it names a visit, bump that visit's
    /// `page_count` by one. Returns `false` without writing anything when the
    /// named visit does not exist.
    async fn insert_page_view(&self, page_view: &NewPageView) -> anyhow::Result<bool>;

    async fn insert_express_check(&self, check: &NewExpressCheck) -> anyhow::Result<()>;

    /// Returns `false` when no page view has this id.
    async fn close_page_view(&self, id: &str, exit: &PageViewExit) -> anyhow::Result<bool>;

    /// Returns `false` when no visit has this id.
    async fn close_visit(&self, id: &str, end: &VisitEnd) -> anyhow::Result<bool>;

    async fn get_overview(&self, range: &DateRange) -> anyhow::Result<Overview>;

    async fn get_page_stats(&self, range: &DateRange, limit: i64)
        -> anyhow::Result<Vec<PageStat>>;

    async fn get_visitor_rollup(
        &self,
        range: &DateRange,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<VisitorRollup>>;

    async fn get_express_checks(
        &self,
        range: &DateRange,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<ExpressChecksPage>;

    async fn get_conversions(&self, range: &DateRange) -> anyhow::Result<Conversions>;

    /// Buckets are calendar units in `tz`.
    async fn get_timeline(
        &self,
        range: &DateRange,
        granularity: Granularity,
        tz: Tz,
    ) -> anyhow::Result<Timeline>;

    async fn get_devices(&self, range: &DateRange) -> anyhow::Result<Devices>;

    async fn get_users_detail(&self, range: &DateRange) -> anyhow::Result<Vec<UserDetail>>;

    async fn get_express_detail(&self, range: &DateRange) -> anyhow::Result<Vec<ExpressDetail>>;
}
