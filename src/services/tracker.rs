// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video state tracker.
//!
//! Owns completion flags and the playlist counters derived from them. Every
//! mutation goes through [`Store::update_video`] or [`Store::delete_video`],
//! which apply the video change, the [`CounterDelta`](crate::models::CounterDelta)
//! and any order shift as one unit.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{Playlist, User, Video, VideoPatch};
use crate::services::session::IdentityClaim;
use crate::services::{current_user, owned_playlist};
use std::sync::Arc;

pub struct VideoStateTracker {
    store: Arc<dyn Store>,
}

impl VideoStateTracker {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Load a video, checking that its playlist belongs to `user`.
    async fn owned_video(&self, user: &User, video_id: &str) -> Result<Video, AppError> {
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {}", video_id)))?;
        owned_playlist(self.store.as_ref(), user, &video.in_playlist).await?;
        Ok(video)
    }

    pub async fn get_video(&self, claim: &IdentityClaim, video_id: &str) -> Result<Video, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.owned_video(&user, video_id).await
    }

    /// A playlist with its videos in `order`.
    pub async fn list_playlist_videos(
        &self,
        claim: &IdentityClaim,
        playlist_id: &str,
    ) -> Result<(Playlist, Vec<Video>), AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        let playlist = owned_playlist(self.store.as_ref(), &user, playlist_id).await?;
        let videos = self.store.list_videos(playlist_id).await?;
        Ok((playlist, videos))
    }

    /// Set a video's completed flag.
    ///
    /// Repeating the current value changes nothing, including the counter.
    pub async fn set_completion(
        &self,
        claim: &IdentityClaim,
        video_id: &str,
        completed: bool,
    ) -> Result<Video, AppError> {
        self.update_video(claim, video_id, &VideoPatch::completion(completed))
            .await
    }

    pub async fn update_video(
        &self,
        claim: &IdentityClaim,
        video_id: &str,
        patch: &VideoPatch,
    ) -> Result<Video, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.owned_video(&user, video_id).await?;

        self.store
            .update_video(video_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {}", video_id)))
    }

    /// Remove a video and close the gap it leaves in `order`.
    pub async fn delete_video(
        &self,
        claim: &IdentityClaim,
        video_id: &str,
    ) -> Result<Video, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.owned_video(&user, video_id).await?;

        let removed = self
            .store
            .delete_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {}", video_id)))?;

        tracing::info!(
            user_id = %user.id,
            video_id,
            playlist_id = %removed.in_playlist,
            order = removed.order,
            "Video deleted"
        );
        Ok(removed)
    }
}
