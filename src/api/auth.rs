use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::UserError;

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the bearer token on the request and stores the owning
/// [`User`](crate::db::User) as a request extension.
///
/// Accepts `Authorization: Token <key>` and `Authorization: Bearer <key>`.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&headers) else {
        return Err(ApiError::unauthorized(
            "Authentication credentials were not provided.",
        ));
    };

    let user = state
        .users
        .resolve_token(&token)
        .await
        .map_err(|e| match e {
            UserError::InvalidToken => ApiError::unauthorized("Invalid token."),
            other => other.into(),
        })?;

    tracing::Span::current().record("user_id", user.id.value());
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extract the token key from the `Authorization` header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("Authorization")?.to_str().ok()?;
    let (scheme, key) = auth_str.trim().split_once(' ')?;

    let key = key.trim();
    if key.is_empty() || key.contains(' ') {
        return None;
    }

    (scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer"))
        .then(|| key.to_string())
}
