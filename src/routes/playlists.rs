// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playlist routes: import, list, view, delete.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::{Playlist, Video};
use crate::services::IdentityClaim;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/playlists", get(list_playlists).post(import_playlist))
        .route(
            "/api/playlists/{id}",
            get(get_playlist).delete(delete_playlist),
        )
        .route("/api/playlists/{id}/videos", get(playlist_videos))
}

async fn list_playlists(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
) -> Result<Json<Vec<Playlist>>> {
    Ok(Json(state.importer.list_playlists(&claim).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    /// YouTube playlist ID
    #[validate(length(min = 1, max = 128))]
    pub list_id: String,
}

async fn import_playlist(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Json(body): Json<ImportRequest>,
) -> Result<(StatusCode, Json<Playlist>)> {
    body.validate()?;
    let playlist = state.importer.import_playlist(&claim, &body.list_id).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<Playlist>> {
    Ok(Json(state.importer.get_playlist(&claim, &id).await?))
}

#[derive(Debug, Serialize)]
pub struct DeletePlaylistResponse {
    pub success: bool,
    pub id: String,
    pub deleted_videos: usize,
}

async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<DeletePlaylistResponse>> {
    let deleted_videos = state.importer.delete_playlist(&claim, &id).await?;
    Ok(Json(DeletePlaylistResponse {
        success: true,
        id,
        deleted_videos,
    }))
}

#[derive(Debug, Serialize)]
pub struct PlaylistVideosResponse {
    pub playlist: Playlist,
    pub videos: Vec<Video>,
}

async fn playlist_videos(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<PlaylistVideosResponse>> {
    let (playlist, videos) = state.tracker.list_playlist_videos(&claim, &id).await?;
    Ok(Json(PlaylistVideosResponse { playlist, videos }))
}
