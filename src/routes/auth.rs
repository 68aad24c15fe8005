// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in and session routes.
//!
//! The frontend runs the Google consent screen and posts the resulting
//! authorization code here. The access token travels in response bodies;
//! the session refresh token only ever travels in a signed cookie.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::UserProfile;
use crate::services::{IdentityClaim, LoginRecord};
use crate::{AppState, SessionCookieKey};

/// Name of the cookie carrying the session refresh token.
pub const REFRESH_COOKIE: &str = "playlist_refresh";

type SessionJar = SignedCookieJar<SessionCookieKey>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Routes that also need an access token.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

/// Build the session cookie. A zero `max_age_secs` clears it.
fn session_cookie(value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Authorization code from Google's consent screen
    #[validate(length(min = 1, max = 2048))]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
    /// Present (and true) on a user's first login
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub new: bool,
}

/// Exchange an authorization code, record the login, start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
    Json(body): Json<LoginRequest>,
) -> Result<(StatusCode, SessionJar, Json<LoginResponse>)> {
    body.validate()?;

    let grant = state.identity.exchange_code(&body.code).await?;
    let claim = IdentityClaim {
        email: grant.identity.email.clone(),
    };
    let tokens = state.sessions.issue_tokens(&claim)?;

    let (user, created) = state
        .credentials
        .record_login(&LoginRecord {
            email: &grant.identity.email,
            name: &grant.identity.name,
            picture: grant.identity.picture.as_deref(),
            google_refresh_token: grant.refresh_token.as_deref(),
            calendar_access: grant.calendar_granted(),
            session_token: &tokens.refresh_token,
        })
        .await?;

    tracing::info!(user_id = %user.id, new_user = created, "Login successful");

    let jar = jar.add(session_cookie(
        tokens.refresh_token,
        tokens.refresh_max_age_secs,
    ));
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        jar,
        Json(LoginResponse {
            token: tokens.access_token,
            user: UserProfile::from(&user),
            new: created,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub email: String,
}

/// Rotate the session refresh token and mint a new access token.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
) -> Result<(SessionJar, Json<RefreshResponse>)> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let (claim, tokens) = state.sessions.refresh(presented.as_deref()).await?;

    let jar = jar.add(session_cookie(
        tokens.refresh_token,
        tokens.refresh_max_age_secs,
    ));
    Ok((
        jar,
        Json(RefreshResponse {
            token: tokens.access_token,
            email: claim.email,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub id: String,
}

/// End this device's session and clear its cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    jar: SessionJar,
) -> Result<(SessionJar, Json<LogoutResponse>)> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let user = state.sessions.revoke(presented.as_deref(), &claim).await?;

    let jar = jar.add(session_cookie(String::new(), 0));
    Ok((
        jar,
        Json(LogoutResponse {
            success: true,
            id: user.id,
        }),
    ))
}
