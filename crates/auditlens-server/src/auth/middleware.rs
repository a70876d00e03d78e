use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use auditlens_core::config::AuthMode;
use auditlens_core::principal::{Principal, Role};

use crate::error::AppError;
use crate::state::AppState;

use super::jwt::decode_jwt;

/// Resolve the caller into a [`Principal`] and store it in request extensions.
///
/// - `AUDITLENS_AUTH=none`: every caller is an administrator without a user id.
/// - `jwt`: no `Authorization` header means anonymous; a bearer token must
///   verify, otherwise the request is rejected with 401.
pub async fn attach_principal(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match &state.config.auth_mode {
        AuthMode::None => Principal {
            user_id: None,
            role: Role::Admin,
        },
        AuthMode::Jwt(secret) => match bearer_token(&request) {
            None => Principal::anonymous(),
            Some(token) => match decode_jwt(&token, secret) {
                Ok(claims) => claims.into_principal(),
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected bearer token");
                    return AppError::Unauthorized.into_response();
                }
            },
        },
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Gate for the read endpoints: 401 for anonymous callers, 403 for
/// authenticated non-admins.
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<Principal>() {
        Some(principal) if principal.is_admin() => next.run(request).await,
        Some(principal) if principal.user_id.is_some() => AppError::Forbidden.into_response(),
        _ => AppError::Unauthorized.into_response(),
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}
