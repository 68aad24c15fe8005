// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Note routes.

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
use crate::models::{Note, NotePatch};
use crate::services::{IdentityClaim, NewNote};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/video/{id}", get(notes_for_video))
        .route(
            "/api/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
}

async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
) -> Result<Json<Vec<Note>>> {
    Ok(Json(state.notes.list_notes(&claim).await?))
}

async fn notes_for_video(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(video_id): Path<String>,
) -> Result<Json<Vec<Note>>> {
    Ok(Json(state.notes.list_notes_for_video(&claim, &video_id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 32))]
    pub kind: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[validate(range(min = 0.0))]
    pub timestamp: Option<f64>,
    pub in_playlist: Option<String>,
    pub in_video: Option<String>,
    #[validate(url)]
    pub page_url: Option<String>,
}

async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Json(body): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>)> {
    body.validate()?;
    let note = state
        .notes
        .create_note(
            &claim,
            NewNote {
                kind: body.kind,
                title: body.title,
                content: body.content,
                timestamp: body.timestamp,
                in_playlist: body.in_playlist,
                in_video: body.in_video,
                page_url: body.page_url,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn get_note(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<Note>> {
    Ok(Json(state.notes.get_note(&claim, &id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    #[validate(range(min = 0.0))]
    pub timestamp: Option<f64>,
}

async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<Json<Note>> {
    body.validate()?;
    let patch = NotePatch {
        title: body.title,
        content: body.content,
        timestamp: body.timestamp,
    };
    Ok(Json(state.notes.update_note(&claim, &id, &patch).await?))
}

#[derive(Debug, Serialize)]
pub struct DeleteNoteResponse {
    pub success: bool,
    pub id: String,
}

async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<DeleteNoteResponse>> {
    state.notes.delete_note(&claim, &id).await?;
    Ok(Json(DeleteNoteResponse { success: true, id }))
}
