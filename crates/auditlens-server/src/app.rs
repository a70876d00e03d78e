use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::middleware::{attach_principal, require_admin},
    routes,
    state::AppState,
};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// - `/health` is public.
/// - `/api/analytics/track/*` accepts anonymous traffic; the caller's
///   principal (if any) is attached for attribution.
/// - Every other `/api/analytics/*` route requires an admin principal.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/analytics", analytics_router(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn analytics_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let reads = Router::new()
        .route("/overview", get(routes::analytics::overview))
        .route("/pages", get(routes::analytics::pages))
        .route("/visitors", get(routes::analytics::visitors))
        .route("/express-checks", get(routes::analytics::express_checks))
        .route("/conversions", get(routes::analytics::conversions))
        .route("/timeline", get(routes::analytics::timeline))
        .route("/devices", get(routes::analytics::devices))
        .route("/users-detail", get(routes::analytics::users_detail))
        .route("/express-detail", get(routes::analytics::express_detail))
        .route_layer(middleware::from_fn(require_admin));

    let track = Router::new()
        .route("/track/visit", post(routes::track::begin_visit))
        .route("/track/visit/{id}/end", post(routes::track::close_visit))
        .route("/track/pageview", post(routes::track::record_page_view))
        .route(
            "/track/pageview/{id}/update",
            post(routes::track::close_page_view),
        )
        .route(
            "/track/express-check",
            post(routes::track::record_express_check),
        );

    reads
        .merge(track)
        .layer(middleware::from_fn_with_state(state, attach_principal))
}

/// Any origin unless `AUDITLENS_CORS_ORIGINS` lists specific ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| o.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
