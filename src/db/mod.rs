// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Services talk to a [`Store`]; production runs on Firestore, local
//! development and tests on the in-memory backend.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Event, Note, NotePatch, Playlist, SessionEntry, User, Video, VideoPatch};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Session refresh tokens (keyed by token digest)
    pub const SESSIONS: &str = "sessions";
    pub const PLAYLISTS: &str = "playlists";
    pub const VIDEOS: &str = "videos";
    pub const EVENTS: &str = "events";
    pub const NOTES: &str = "notes";
}

/// Typed storage operations.
///
/// Every method that touches more than one document is atomic: either all
/// of its writes land or none do.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Look up a user by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .get_user(&User::id_for_email(email))
            .await?
            .filter(|user| user.email == email))
    }

    /// Create a user together with its first session entry.
    ///
    /// Returns `false` (and writes nothing) if the user already exists.
    async fn create_user(&self, user: &User, session: &SessionEntry) -> Result<bool, AppError>;

    /// Record a login by an existing user: add the session entry, set the
    /// calendar flag, and replace the Google refresh token when a new one
    /// was issued.
    ///
    /// Returns the updated user, or `None` if the user does not exist.
    async fn record_returning_login(
        &self,
        user_id: &str,
        session: &SessionEntry,
        calendar_access: bool,
        google_refresh_token: Option<&str>,
        now: &str,
    ) -> Result<Option<User>, AppError>;

    async fn update_profile(
        &self,
        user_id: &str,
        name: &str,
        image: &str,
        now: &str,
    ) -> Result<Option<User>, AppError>;

    // ─── Sessions ────────────────────────────────────────────────

    /// Whether `refresh_token` is in the user's active session set.
    async fn session_active(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError>;

    /// Replace `old_token` with `new_session` in the user's session set.
    ///
    /// Returns `false` (and writes nothing) if `old_token` is not active.
    async fn rotate_session(
        &self,
        user_id: &str,
        old_token: &str,
        new_session: &SessionEntry,
    ) -> Result<bool, AppError>;

    /// Remove exactly one session entry. Returns `false` if it was not active.
    async fn remove_session(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError>;

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionEntry>, AppError>;

    // ─── Playlists ───────────────────────────────────────────────

    async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, AppError>;

    /// Playlists owned by a user, newest first.
    async fn list_playlists(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError>;

    /// Store a playlist together with all of its videos.
    ///
    /// Returns `false` (and writes nothing) if a playlist with the same
    /// document ID already exists.
    async fn insert_playlist(&self, playlist: &Playlist, videos: &[Video])
        -> Result<bool, AppError>;

    /// Delete a playlist and all of its videos. Returns the number of videos
    /// removed, or `None` if the playlist did not exist.
    async fn delete_playlist(&self, playlist_id: &str) -> Result<Option<usize>, AppError>;

    // ─── Videos ──────────────────────────────────────────────────

    async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError>;

    /// Videos of a playlist sorted by `order`.
    async fn list_videos(&self, playlist_id: &str) -> Result<Vec<Video>, AppError>;

    /// Apply `patch` and adjust the playlist's completed counter by the
    /// resulting delta.
    async fn update_video(&self, video_id: &str, patch: &VideoPatch)
        -> Result<Option<Video>, AppError>;

    /// Delete a video, decrement the playlist counters, and close the gap
    /// in `order`. Returns the deleted video.
    async fn delete_video(&self, video_id: &str) -> Result<Option<Video>, AppError>;

    // ─── Events ──────────────────────────────────────────────────

    async fn insert_event(&self, event: &Event) -> Result<(), AppError>;

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError>;

    /// Events owned by a user, ordered by start time.
    async fn list_events(&self, owner_id: &str) -> Result<Vec<Event>, AppError>;

    async fn delete_event(&self, event_id: &str) -> Result<bool, AppError>;

    // ─── Notes ───────────────────────────────────────────────────

    async fn insert_note(&self, note: &Note) -> Result<(), AppError>;

    async fn get_note(&self, note_id: &str) -> Result<Option<Note>, AppError>;

    /// Notes owned by a user, newest first.
    async fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>, AppError>;

    /// A user's notes on one video, ordered by timestamp.
    async fn list_notes_for_video(
        &self,
        owner_id: &str,
        video_id: &str,
    ) -> Result<Vec<Note>, AppError>;

    async fn update_note(
        &self,
        note_id: &str,
        patch: &NotePatch,
        now: &str,
    ) -> Result<Option<Note>, AppError>;

    async fn delete_note(&self, note_id: &str) -> Result<bool, AppError>;
}

/// Constant-time comparison for session tokens.
pub(crate) fn tokens_match(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

/// Sort notes on one video by their timestamp, untimed notes last.
pub(crate) fn sort_by_timestamp(notes: &mut [Note]) {
    notes.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });
}
