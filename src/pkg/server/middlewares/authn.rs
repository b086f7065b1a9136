use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    pkg::server::state::AppState,
    prelude::{Error, Result},
};

pub const TOKEN_COOKIE: &str = "_Host_token";

/// Bearer token from the `Authorization` header, falling back to the
/// session cookie.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);
    if from_header.is_some() {
        return from_header;
    }
    let jar = CookieJar::from_headers(headers);
    jar.get(TOKEN_COOKIE)
        .filter(|c| !c.value().is_empty())
        .map(|c| c.value().to_string())
}

pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    if let Some(token) = bearer_token(&headers)
        && let Ok(caller) = state.identity.verify(&token)
    {
        tracing::debug!("authenticated caller {}", caller.id);
        request.extensions_mut().insert(Arc::new(caller));
        return Ok(next.run(request).await);
    }
    tracing::warn!("token missing or invalid, authentication denied");
    Err(Error::Unauthorized)
}
