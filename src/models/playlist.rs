// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Imported playlist model and its denormalized counters.

use crate::models::Video;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The only catalog platform currently supported.
pub const DEFAULT_PLATFORM: &str = "youtube";

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

/// Stored playlist record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Playlist {
    /// Document ID, see [`Playlist::document_id`]
    pub id: String,
    pub title: String,
    pub description: String,
    /// Playlist ID on the platform
    pub playlist_id: String,
    pub thumbnail: Option<String>,
    /// Number of videos currently in the playlist
    pub total_videos: u32,
    /// Number of videos marked completed
    #[serde(default)]
    pub completed_videos: u32,
    /// Owning user's ID
    pub created_by: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    /// When the playlist was imported (ISO 8601)
    pub created_at: String,
}

impl Playlist {
    /// Document ID for a user's import of a platform playlist.
    ///
    /// One document per (owner, platform playlist) pair, so a second import
    /// collides with the first instead of creating a copy.
    pub fn document_id(owner_id: &str, external_playlist_id: &str) -> String {
        format!("{}_{}", owner_id, urlencoding::encode(external_playlist_id))
    }

    /// Apply a counter adjustment, clamping at zero.
    pub fn apply(&mut self, delta: CounterDelta) {
        self.total_videos = offset(self.total_videos, delta.total);
        self.completed_videos = offset(self.completed_videos, delta.completed);
    }
}

fn offset(value: u32, by: i64) -> u32 {
    (i64::from(value) + by).clamp(0, i64::from(u32::MAX)) as u32
}

/// Change to a playlist's denormalized counters.
///
/// Every write path that touches `total_videos` or `completed_videos`
/// computes one of these and hands it to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub total: i64,
    pub completed: i64,
}

impl CounterDelta {
    /// Delta for a video whose completed flag goes from `before` to `after`.
    pub fn completion_change(before: bool, after: bool) -> Self {
        let completed = match (before, after) {
            (false, true) => 1,
            (true, false) => -1,
            _ => 0,
        };
        Self {
            total: 0,
            completed,
        }
    }

    /// Delta for removing `video` from its playlist.
    pub fn removal(video: &Video) -> Self {
        Self {
            total: -1,
            completed: if video.completed { -1 } else { 0 },
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total == 0 && self.completed == 0
    }
}
