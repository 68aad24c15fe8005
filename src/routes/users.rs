// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for the signed-in user.

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::services::IdentityClaim;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/user", get(get_user).put(update_user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.credentials.get_profile(&claim).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(url)]
    pub image: String,
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>> {
    body.validate()?;
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be blank".to_string()));
    }

    let profile = state
        .credentials
        .update_profile(&claim, &body.name, &body.image)
        .await?;
    Ok(Json(profile))
}
