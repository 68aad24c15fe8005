// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video routes: view, edit (including completion), delete.

use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::{Video, VideoPatch};
use crate::services::IdentityClaim;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/videos/{id}",
        get(get_video).patch(update_video).delete(delete_video),
    )
}

async fn get_video(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<Video>> {
    Ok(Json(state.tracker.get_video(&claim, &id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl From<UpdateVideoRequest> for VideoPatch {
    fn from(body: UpdateVideoRequest) -> Self {
        VideoPatch {
            title: body.title,
            description: body.description,
            completed: body.completed,
        }
    }
}

async fn update_video(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
    Json(body): Json<UpdateVideoRequest>,
) -> Result<Json<Video>> {
    body.validate()?;
    let patch = VideoPatch::from(body);
    Ok(Json(state.tracker.update_video(&claim, &id, &patch).await?))
}

#[derive(Debug, Serialize)]
pub struct DeleteVideoResponse {
    pub success: bool,
    pub id: String,
}

async fn delete_video(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<DeleteVideoResponse>> {
    let removed = state.tracker.delete_video(&claim, &id).await?;
    Ok(Json(DeleteVideoResponse {
        success: true,
        id: removed.id,
    }))
}
