// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notes on videos and playlists, private to their creator.

use crate::db::Store;
use crate::error::AppError;
use crate::ids;
use crate::models::{Note, NotePatch, User};
use crate::services::session::IdentityClaim;
use crate::services::{current_user, owned_playlist};
use crate::time_utils::format_utc_rfc3339;
use std::sync::Arc;

const DEFAULT_KIND: &str = "invideo";

/// Input for a new note.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub kind: Option<String>,
    pub title: String,
    pub content: serde_json::Value,
    pub timestamp: Option<f64>,
    pub in_playlist: Option<String>,
    pub in_video: Option<String>,
    pub page_url: Option<String>,
}

pub struct NotesService {
    store: Arc<dyn Store>,
}

impl NotesService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Check that the referenced video/playlist exist and belong to `user`.
    ///
    /// Returns the playlist the note belongs to, derived from the video
    /// when only a video is given.
    async fn check_references(
        &self,
        user: &User,
        in_playlist: Option<&str>,
        in_video: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        let video_playlist = match in_video {
            Some(video_id) => {
                let video = self
                    .store
                    .get_video(video_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Video {}", video_id)))?;
                Some(video.in_playlist)
            }
            None => None,
        };

        match (in_playlist, video_playlist) {
            (Some(given), Some(actual)) if given != actual => Err(AppError::BadRequest(
                "Video is not in the given playlist".to_string(),
            )),
            (Some(playlist_id), _) => {
                owned_playlist(self.store.as_ref(), user, playlist_id).await?;
                Ok(Some(playlist_id.to_string()))
            }
            (None, Some(playlist_id)) => {
                owned_playlist(self.store.as_ref(), user, &playlist_id).await?;
                Ok(Some(playlist_id))
            }
            (None, None) => Ok(None),
        }
    }

    async fn owned_note(&self, user: &User, note_id: &str) -> Result<Note, AppError> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note {}", note_id)))?;
        if note.created_by != user.id {
            return Err(AppError::Forbidden("Note belongs to another user".to_string()));
        }
        Ok(note)
    }

    pub async fn create_note(&self, claim: &IdentityClaim, input: NewNote) -> Result<Note, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        let in_playlist = self
            .check_references(&user, input.in_playlist.as_deref(), input.in_video.as_deref())
            .await?;

        let now = format_utc_rfc3339(chrono::Utc::now());
        let note = Note {
            id: ids::new_document_id(),
            kind: input.kind.unwrap_or_else(|| DEFAULT_KIND.to_string()),
            title: input.title,
            content: input.content,
            timestamp: input.timestamp,
            created_by: user.id.clone(),
            in_playlist,
            in_video: input.in_video,
            page_url: input.page_url.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.store.insert_note(&note).await?;

        tracing::debug!(user_id = %user.id, note_id = %note.id, "Note created");
        Ok(note)
    }

    pub async fn get_note(&self, claim: &IdentityClaim, note_id: &str) -> Result<Note, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.owned_note(&user, note_id).await
    }

    /// The caller's notes, newest first.
    pub async fn list_notes(&self, claim: &IdentityClaim) -> Result<Vec<Note>, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.store.list_notes(&user.id).await
    }

    /// The caller's notes on one video, by timestamp.
    pub async fn list_notes_for_video(
        &self,
        claim: &IdentityClaim,
        video_id: &str,
    ) -> Result<Vec<Note>, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.check_references(&user, None, Some(video_id)).await?;
        self.store.list_notes_for_video(&user.id, video_id).await
    }

    pub async fn update_note(
        &self,
        claim: &IdentityClaim,
        note_id: &str,
        patch: &NotePatch,
    ) -> Result<Note, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.owned_note(&user, note_id).await?;

        let now = format_utc_rfc3339(chrono::Utc::now());
        self.store
            .update_note(note_id, patch, &now)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note {}", note_id)))
    }

    pub async fn delete_note(&self, claim: &IdentityClaim, note_id: &str) -> Result<(), AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.owned_note(&user, note_id).await?;

        if !self.store.delete_note(note_id).await? {
            return Err(AppError::NotFound(format!("Note {}", note_id)));
        }
        Ok(())
    }
}
