use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde_json::json;

use auditlens_core::event::{
    BeginVisit, ClosePageView, CloseVisit, RecordExpressCheck, RecordPageView,
};
use auditlens_core::ingest;
use auditlens_core::principal::Principal;

use crate::{error::AppError, routes::client::Client, state::AppState};

/// `POST /api/analytics/track/visit` - start a visit.
#[tracing::instrument(skip_all)]
pub async fn begin_visit(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Client(client): Client,
    Json(payload): Json<BeginVisit>,
) -> Result<impl IntoResponse, AppError> {
    let visit_id = ingest::begin_visit(
        state.analytics.as_ref(),
        &principal,
        &client,
        payload,
        Utc::now(),
    )
    .await?;
    tracing::debug!(%visit_id, "visit recorded");
    Ok((StatusCode::CREATED, Json(json!({ "visitId": visit_id }))))
}

/// `POST /api/analytics/track/pageview` - record a page view.
#[tracing::instrument(skip_all)]
pub async fn record_page_view(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<RecordPageView>,
) -> Result<impl IntoResponse, AppError> {
    let page_view_id =
        ingest::record_page_view(state.analytics.as_ref(), &principal, payload, Utc::now())
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "pageViewId": page_view_id })),
    ))
}

/// `POST /api/analytics/track/pageview/{id}/update` - close a page view.
#[tracing::instrument(skip(state, payload))]
pub async fn close_page_view(
    State(state): State<Arc<AppState>>,
    Path(page_view_id): Path<String>,
    Json(payload): Json<ClosePageView>,
) -> Result<impl IntoResponse, AppError> {
    ingest::close_page_view(state.analytics.as_ref(), &page_view_id, payload, Utc::now()).await?;
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/analytics/track/visit/{id}/end` - close a visit.
#[tracing::instrument(skip(state, payload))]
pub async fn close_visit(
    State(state): State<Arc<AppState>>,
    Path(visit_id): Path<String>,
    Json(payload): Json<CloseVisit>,
) -> Result<impl IntoResponse, AppError> {
    ingest::close_visit(state.analytics.as_ref(), &visit_id, payload, Utc::now()).await?;
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/analytics/track/express-check` - record an express compliance check.
#[tracing::instrument(skip_all)]
pub async fn record_express_check(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Client(client): Client,
    Json(payload): Json<RecordExpressCheck>,
) -> Result<impl IntoResponse, AppError> {
    let check_id = ingest::record_express_check(
        state.analytics.as_ref(),
        &principal,
        &client,
        payload,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(json!({ "checkId": check_id }))))
}
