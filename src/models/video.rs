// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video model: one catalog item inside an imported playlist.

use crate::models::CounterDelta;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

fn default_platform() -> String {
    crate::models::DEFAULT_PLATFORM.to_string()
}

/// Stored video record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Video {
    /// Document ID
    pub id: String,
    pub title: String,
    pub description: String,
    /// Video ID on the platform
    pub video_id: String,
    pub thumbnail: String,
    /// Zero-based position within the playlist
    pub order: u32,
    #[serde(default)]
    pub completed: bool,
    /// Owning playlist's document ID
    pub in_playlist: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    /// When the video was imported (ISO 8601)
    pub created_at: String,
}

/// Partial update to a video's user-editable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl VideoPatch {
    /// Patch that only sets the completed flag.
    pub fn completion(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Apply to `video`, returning the resulting change to the playlist counters.
    pub fn apply(&self, video: &mut Video) -> CounterDelta {
        if let Some(title) = &self.title {
            video.title = title.clone();
        }
        if let Some(description) = &self.description {
            video.description = description.clone();
        }
        let before = video.completed;
        if let Some(completed) = self.completed {
            video.completed = completed;
        }
        CounterDelta::completion_change(before, video.completed)
    }
}

/// Shift every video positioned after `removed_order` down by one.
///
/// Returns how many videos moved.
pub fn close_gap<'a>(videos: impl IntoIterator<Item = &'a mut Video>, removed_order: u32) -> usize {
    let mut moved = 0;
    for video in videos {
        if video.order > removed_order {
            video.order -= 1;
            moved += 1;
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(order: u32, completed: bool) -> Video {
        Video {
            id: format!("v{order}"),
            title: format!("Video {order}"),
            description: String::new(),
            video_id: format!("yt{order}"),
            thumbnail: String::new(),
            order,
            completed,
            in_playlist: "p".to_string(),
            platform: "youtube".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_patch_reports_completion_transition() {
        let mut v = video(0, false);
        let delta = VideoPatch::completion(true).apply(&mut v);
        assert!(v.completed);
        assert_eq!(delta.completed, 1);

        let delta = VideoPatch::completion(true).apply(&mut v);
        assert!(delta.is_zero(), "redundant update must not count twice");
    }

    #[test]
    fn test_patch_without_completed_leaves_flag() {
        let mut v = video(0, true);
        let patch = VideoPatch {
            title: Some("Renamed".to_string()),
            ..VideoPatch::default()
        };
        let delta = patch.apply(&mut v);
        assert!(v.completed);
        assert_eq!(v.title, "Renamed");
        assert!(delta.is_zero());
    }

    #[test]
    fn test_close_gap_shifts_only_later_videos() {
        let mut videos = vec![video(0, false), video(2, false), video(3, false)];
        let moved = close_gap(videos.iter_mut(), 1);
        assert_eq!(moved, 2);
        let orders: Vec<u32> = videos.iter().map(|v| v.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }
}
