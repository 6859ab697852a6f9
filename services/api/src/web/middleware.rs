//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use positions_core::ports::PortError;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Cookie the auth service stores the access token in.
const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Middleware that verifies the caller's access token.
///
/// If valid, inserts the `Caller` into request extensions for handlers to use.
/// If invalid or missing, returns a 401 envelope.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers()).ok_or(PortError::Unauthorized)?;
    let caller = state.tokens.verify(&token)?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

/// Reads a bearer token, falling back to the `access_token` cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(ACCESS_TOKEN_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(str::to_string)
}
