// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token authentication middleware.

use crate::error::{AppError, AuthFailure};
use crate::services::IdentityClaim;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header carrying the access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-auth-token";

/// Read the access token from `x-auth-token`, falling back to
/// `Authorization: Bearer`.
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.is_empty())
    {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid access token.
///
/// On success the request carries an [`IdentityClaim`] extension.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = access_token_from_headers(request.headers())
        .ok_or(AppError::Unauthenticated(AuthFailure::MissingCredential))?;

    let claim = state.sessions.verify_access(token)?;
    request.extensions_mut().insert(claim);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_access_token_header_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(access_token_from_headers(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(access_token_from_headers(&headers), Some("abc"));

        headers.insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(access_token_from_headers(&headers), Some("xyz"));
    }

    #[test]
    fn test_malformed_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(access_token_from_headers(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(access_token_from_headers(&headers), None);
    }
}
