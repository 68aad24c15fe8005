// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! YouTube Data API client for playlist imports.
//!
//! Only two read endpoints are used: `playlists` (metadata) and
//! `playlistItems` (paginated contents). Responses are deserialized into
//! typed structs and converted to catalog records at the boundary.

use crate::config::Config;
use crate::error::AppError;
use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use serde::Deserialize;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Maximum page size accepted by `playlistItems.list`.
pub const PAGE_SIZE: u32 = 50;

/// Shown for items without a thumbnail (private or deleted videos).
pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://via.placeholder.com/480x360.png?text=Private+Video";

/// Playlist metadata as reported by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPlaylist {
    pub playlist_id: String,
    pub title: String,
    pub description: String,
    pub item_count: u32,
    pub thumbnail: Option<String>,
}

/// One playlist entry as reported by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub video_id: String,
    pub title: String,
    pub description: String,
    /// Provider-assigned zero-based position
    pub position: u32,
    pub thumbnail: String,
}

/// One page of playlist entries.
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub items: Vec<CatalogItem>,
    pub next_page_token: Option<String>,
}

/// External video catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Playlist metadata, or `None` if the catalog does not know the id.
    async fn playlist(&self, playlist_id: &str) -> Result<Option<CatalogPlaylist>, AppError>;

    /// One page of playlist items. `page_token` is `None` for the first page.
    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<ItemPage, AppError>;
}

enum Cursor {
    First,
    Next(String),
    Done,
}

/// Stream every page of a playlist's items, in provider order.
///
/// Ends after the first page without a (non-empty) next-page token; the
/// first error ends the stream.
pub fn playlist_item_pages<'a>(
    provider: &'a dyn CatalogProvider,
    playlist_id: &'a str,
) -> impl Stream<Item = Result<Vec<CatalogItem>, AppError>> + Send + 'a {
    stream::try_unfold(Cursor::First, move |cursor| async move {
        let token = match cursor {
            Cursor::First => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok(None),
        };

        let page = provider
            .playlist_items(playlist_id, token.as_deref())
            .await?;

        let next = match page.next_page_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Done,
        };
        Ok(Some((page.items, next)))
    })
}

/// YouTube Data API v3 client (API-key authenticated).
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            api_key: config.youtube_api_key.clone(),
        })
    }

    /// GET `{base}/{resource}` with query parameters and parse the JSON body.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, resource);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("YouTube request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("YouTube {} not found", resource)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "YouTube {} returned HTTP {}: {}",
                resource, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Unexpected YouTube response: {}", e)))
    }
}

#[async_trait]
impl CatalogProvider for YouTubeClient {
    async fn playlist(&self, playlist_id: &str) -> Result<Option<CatalogPlaylist>, AppError> {
        let response: PlaylistListResponse = match self
            .get_json(
                "playlists",
                &[("part", "snippet,contentDetails"), ("id", playlist_id)],
            )
            .await
        {
            Ok(response) => response,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(response.items.into_iter().next().map(CatalogPlaylist::from))
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<ItemPage, AppError> {
        let max_results = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: PlaylistItemListResponse = self.get_json("playlistItems", &query).await?;

        Ok(ItemPage {
            items: response
                .items
                .into_iter()
                .map(CatalogItem::from)
                .collect(),
            next_page_token: response.next_page_token,
        })
    }
}

// ─── Response Types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<PlaylistResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistResource {
    id: String,
    snippet: PlaylistSnippet,
    content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    item_count: u32,
}

/// Private and deleted videos come back with an empty thumbnails object.
#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResource {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    #[serde(default)]
    description: String,
    position: u32,
    #[serde(default)]
    thumbnails: Thumbnails,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

impl From<PlaylistResource> for CatalogPlaylist {
    fn from(resource: PlaylistResource) -> Self {
        Self {
            playlist_id: resource.id,
            title: resource.snippet.title,
            description: resource.snippet.description,
            item_count: resource
                .content_details
                .map(|d| d.item_count)
                .unwrap_or_default(),
            thumbnail: resource.snippet.thumbnails.high.map(|t| t.url),
        }
    }
}

impl From<PlaylistItemResource> for CatalogItem {
    fn from(resource: PlaylistItemResource) -> Self {
        let snippet = resource.snippet;
        Self {
            video_id: snippet.resource_id.video_id,
            title: snippet.title,
            description: snippet.description,
            position: snippet.position,
            thumbnail: snippet
                .thumbnails
                .high
                .map(|t| t.url)
                .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string()),
        }
    }
}
