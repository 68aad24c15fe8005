// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Free-text notes attached to a video or playlist.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

fn default_kind() -> String {
    "invideo".to_string()
}

/// Stored note record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Note {
    pub id: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub content: serde_json::Value,
    /// Seconds into the video the note refers to
    pub timestamp: Option<f64>,
    /// Owning user's ID
    pub created_by: String,
    pub in_playlist: Option<String>,
    pub in_video: Option<String>,
    #[serde(default)]
    pub page_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update to a note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub timestamp: Option<f64>,
}

impl NotePatch {
    pub fn apply(&self, note: &mut Note, now: &str) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(timestamp) = self.timestamp {
            note.timestamp = Some(timestamp);
        }
        note.updated_at = now.to_string();
    }
}
