// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog importer: copies a YouTube playlist into the store.
//!
//! The whole playlist is fetched before anything is written, then stored in
//! a single call, so a provider failure on any page leaves no trace.

use crate::db::Store;
use crate::error::AppError;
use crate::ids;
use crate::models::{Playlist, Video, DEFAULT_PLATFORM};
use crate::services::session::IdentityClaim;
use crate::services::youtube::{playlist_item_pages, CatalogItem, CatalogProvider};
use crate::services::{current_user, owned_playlist};
use crate::time_utils::format_utc_rfc3339;
use futures_util::TryStreamExt;
use std::sync::Arc;

pub struct CatalogImporter {
    store: Arc<dyn Store>,
    catalog: Arc<dyn CatalogProvider>,
}

impl CatalogImporter {
    pub fn new(store: Arc<dyn Store>, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { store, catalog }
    }

    /// Import `external_id` for the calling user.
    ///
    /// Fails with `Duplicate` if the user already imported it, `NotFound`
    /// if the catalog does not know it, and `Provider` if any page fetch
    /// fails.
    pub async fn import_playlist(
        &self,
        claim: &IdentityClaim,
        external_id: &str,
    ) -> Result<Playlist, AppError> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(AppError::BadRequest("Playlist ID is required".to_string()));
        }

        let user = current_user(self.store.as_ref(), claim).await?;
        let playlist_doc_id = Playlist::document_id(&user.id, external_id);

        if self.store.get_playlist(&playlist_doc_id).await?.is_some() {
            return Err(AppError::Duplicate(format!(
                "Playlist {} already imported",
                external_id
            )));
        }

        let metadata = self
            .catalog
            .playlist(external_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {}", external_id)))?;

        let now = format_utc_rfc3339(chrono::Utc::now());
        let videos = self
            .fetch_videos(external_id, &playlist_doc_id, &now)
            .await?;

        let total_videos = u32::try_from(videos.len())
            .map_err(|_| AppError::BadRequest("Playlist is too large".to_string()))?;
        if total_videos != metadata.item_count {
            tracing::warn!(
                playlist_id = external_id,
                reported = metadata.item_count,
                imported = total_videos,
                "Catalog item count differs from items received"
            );
        }

        let playlist = Playlist {
            id: playlist_doc_id,
            title: metadata.title,
            description: metadata.description,
            playlist_id: metadata.playlist_id,
            thumbnail: metadata.thumbnail,
            total_videos,
            completed_videos: 0,
            created_by: user.id.clone(),
            platform: DEFAULT_PLATFORM.to_string(),
            created_at: now,
        };

        if !self.store.insert_playlist(&playlist, &videos).await? {
            return Err(AppError::Duplicate(format!(
                "Playlist {} already imported",
                external_id
            )));
        }

        tracing::info!(
            user_id = %user.id,
            playlist_id = %playlist.id,
            videos = total_videos,
            "Playlist imported"
        );
        Ok(playlist)
    }

    /// Drain every page of the playlist into video records.
    async fn fetch_videos(
        &self,
        external_id: &str,
        playlist_doc_id: &str,
        now: &str,
    ) -> Result<Vec<Video>, AppError> {
        let mut pages = std::pin::pin!(playlist_item_pages(self.catalog.as_ref(), external_id));
        let mut videos = Vec::new();
        let mut page_count = 0usize;

        while let Some(items) = pages.try_next().await? {
            page_count += 1;
            videos.extend(
                items
                    .into_iter()
                    .map(|item| video_from_item(item, playlist_doc_id, now)),
            );
        }

        tracing::debug!(
            playlist_id = external_id,
            pages = page_count,
            videos = videos.len(),
            "Fetched playlist items"
        );
        Ok(videos)
    }

    /// The caller's playlists, newest first.
    pub async fn list_playlists(&self, claim: &IdentityClaim) -> Result<Vec<Playlist>, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.store.list_playlists(&user.id).await
    }

    pub async fn get_playlist(
        &self,
        claim: &IdentityClaim,
        playlist_id: &str,
    ) -> Result<Playlist, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        owned_playlist(self.store.as_ref(), &user, playlist_id).await
    }

    /// Delete a playlist and all of its videos. Returns the number of
    /// videos removed.
    pub async fn delete_playlist(
        &self,
        claim: &IdentityClaim,
        playlist_id: &str,
    ) -> Result<usize, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        owned_playlist(self.store.as_ref(), &user, playlist_id).await?;

        let removed = self
            .store
            .delete_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {}", playlist_id)))?;

        tracing::info!(user_id = %user.id, playlist_id, videos = removed, "Playlist deleted");
        Ok(removed)
    }
}

/// Video record for one catalog item; `order` is the provider position.
fn video_from_item(item: CatalogItem, playlist_doc_id: &str, now: &str) -> Video {
    Video {
        id: ids::new_document_id(),
        title: item.title,
        description: item.description,
        video_id: item.video_id,
        thumbnail: item.thumbnail,
        order: item.position,
        completed: false,
        in_playlist: playlist_doc_id.to_string(),
        platform: DEFAULT_PLATFORM.to_string(),
        created_at: now.to_string(),
    }
}
