use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, Result},
    services::identity,
    state::AppState,
};

/// Extracts the bearer token from the request's authorization header.
///
/// Only the exact `Bearer <token>` format is accepted.
fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// A middleware that requires a valid bearer token.
///
/// The resolved user is attached to the request's extensions for the
/// downstream handler. Any failure — missing header, bad token, or a
/// token whose account no longer exists — rejects the request here; the
/// handler chain is never invoked on an unauthenticated request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("Checking authentication");

    let token = extract_bearer_token(&request).ok_or_else(|| {
        tracing::warn!("No bearer token in authorization header");
        AppError::Unauthenticated("You are not logged in".to_string())
    })?;

    let user = identity::resolve_by_token(state.store.as_ref(), &state.tokens, token).await?;

    tracing::debug!("User authenticated: {}", user.id());
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
