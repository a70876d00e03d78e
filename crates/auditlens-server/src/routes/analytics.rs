//! Read endpoints. Each one resolves the date range, runs one aggregation and
//! wraps the result as `{"period": {"start", "end"}, "data": …}`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use auditlens_core::analytics::Granularity;
use auditlens_core::period::{DateRange, RangeParams};

use crate::{error::AppError, state::AppState};

const MAX_LIMIT: i64 = 500;
const DEFAULT_PAGES_LIMIT: i64 = 20;
const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
struct Envelope<T> {
    period: DateRange,
    data: T,
}

fn respond<T: Serialize>(period: DateRange, data: T) -> Json<Envelope<T>> {
    Json(Envelope { period, data })
}

/// Query string accepted by every read endpoint.
///
/// Kept flat rather than `#[serde(flatten)]`-ing [`RangeParams`]: flattening
/// through `serde_urlencoded` turns every value into a string and breaks the
/// numeric fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub group_by: Option<String>,
}

impl ReadQuery {
    fn range_params(&self) -> RangeParams {
        RangeParams {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            period: self.period.clone(),
        }
    }

    fn limit(&self, default: i64) -> Result<i64, AppError> {
        match self.limit {
            None => Ok(default),
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
            Some(_) => Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            ))),
        }
    }

    fn offset(&self) -> Result<i64, AppError> {
        match self.offset {
            None => Ok(0),
            Some(offset) if offset >= 0 => Ok(offset),
            Some(_) => Err(AppError::BadRequest(
                "offset must be zero or greater".to_string(),
            )),
        }
    }
}

/// `GET /api/analytics/overview`
#[tracing::instrument(skip(state))]
pub async fn overview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = state.resolve_range(&query.range_params())?;
    let data = state.analytics.get_overview(&range).await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/pages?limit=`
#[tracing::instrument(skip(state))]
pub async fn pages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit(DEFAULT_PAGES_LIMIT)?;
    let range = state.resolve_range(&query.range_params())?;
    let data = state.analytics.get_page_stats(&range, limit).await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/visitors?limit=&offset=`
#[tracing::instrument(skip(state))]
pub async fn visitors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit(DEFAULT_LIST_LIMIT)?;
    let offset = query.offset()?;
    let range = state.resolve_range(&query.range_params())?;
    let data = state
        .analytics
        .get_visitor_rollup(&range, limit, offset)
        .await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/express-checks?limit=&offset=`
#[tracing::instrument(skip(state))]
pub async fn express_checks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit(DEFAULT_LIST_LIMIT)?;
    let offset = query.offset()?;
    let range = state.resolve_range(&query.range_params())?;
    let data = state
        .analytics
        .get_express_checks(&range, limit, offset)
        .await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/conversions`
#[tracing::instrument(skip(state))]
pub async fn conversions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = state.resolve_range(&query.range_params())?;
    let data = state.analytics.get_conversions(&range).await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/timeline?groupBy=hour|day|week|month`
///
/// An unrecognised `groupBy` falls back to `day`.
#[tracing::instrument(skip(state))]
pub async fn timeline(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let granularity = Granularity::parse(query.group_by.as_deref());
    let range = state.resolve_range(&query.range_params())?;
    let data = state
        .analytics
        .get_timeline(&range, granularity, state.config.timezone)
        .await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/devices`
#[tracing::instrument(skip(state))]
pub async fn devices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = state.resolve_range(&query.range_params())?;
    let data = state.analytics.get_devices(&range).await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/users-detail`
#[tracing::instrument(skip(state))]
pub async fn users_detail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = state.resolve_range(&query.range_params())?;
    let data = state.analytics.get_users_detail(&range).await?;
    Ok(respond(range, data))
}

/// `GET /api/analytics/express-detail`
#[tracing::instrument(skip(state))]
pub async fn express_detail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = state.resolve_range(&query.range_params())?;
    let data = state.analytics.get_express_detail(&range).await?;
    Ok(respond(range, data))
}
