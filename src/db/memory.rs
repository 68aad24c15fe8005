// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.
//!
//! All state lives behind one mutex, so every operation is trivially atomic.

use crate::db::{sort_by_timestamp, tokens_match, Store};
use crate::error::AppError;
use crate::models::{
    video, CounterDelta, Event, Note, NotePatch, Playlist, SessionEntry, User, Video, VideoPatch,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    /// Keyed by token digest, like the Firestore collection.
    sessions: HashMap<String, SessionEntry>,
    playlists: HashMap<String, Playlist>,
    videos: HashMap<String, Video>,
    events: HashMap<String, Event>,
    notes: HashMap<String, Note>,
}

impl MemoryState {
    fn active_session(&self, user_id: &str, refresh_token: &str) -> Option<String> {
        let key = SessionEntry::document_id(refresh_token);
        self.sessions
            .get(&key)
            .filter(|entry| {
                entry.user_id == user_id && tokens_match(&entry.refresh_token, refresh_token)
            })
            .map(|_| key)
    }

    fn adjust_playlist(&mut self, playlist_id: &str, delta: CounterDelta) {
        if delta.is_zero() {
            return;
        }
        if let Some(playlist) = self.playlists.get_mut(playlist_id) {
            playlist.apply(delta);
        }
    }
}

/// In-memory [`Store`] implementation.
#[derive(Default)]
pub struct MemoryDb {
    state: Mutex<MemoryState>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        self.state
            .lock()
            .map_err(|e| AppError::Database(format!("in-memory lock poisoned: {e}")))
    }
}

#[async_trait]
impl Store for MemoryDb {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn create_user(&self, user: &User, session: &SessionEntry) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        if state.users.contains_key(&user.id) {
            return Ok(false);
        }
        state.users.insert(user.id.clone(), user.clone());
        state.sessions.insert(
            SessionEntry::document_id(&session.refresh_token),
            session.clone(),
        );
        Ok(true)
    }

    async fn record_returning_login(
        &self,
        user_id: &str,
        session: &SessionEntry,
        calendar_access: bool,
        google_refresh_token: Option<&str>,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.lock()?;
        let Some(user) = state.users.get_mut(user_id) else {
            return Ok(None);
        };
        user.calendar_access = calendar_access;
        if let Some(token) = google_refresh_token {
            user.google_refresh_token = token.to_string();
        }
        user.updated_at = now.to_string();
        let user = user.clone();

        state.sessions.insert(
            SessionEntry::document_id(&session.refresh_token),
            session.clone(),
        );
        Ok(Some(user))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        name: &str,
        image: &str,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.lock()?;
        Ok(state.users.get_mut(user_id).map(|user| {
            user.name = name.to_string();
            user.image = Some(image.to_string());
            user.updated_at = now.to_string();
            user.clone()
        }))
    }

    // ─── Sessions ────────────────────────────────────────────────

    async fn session_active(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError> {
        Ok(self.lock()?.active_session(user_id, refresh_token).is_some())
    }

    async fn rotate_session(
        &self,
        user_id: &str,
        old_token: &str,
        new_session: &SessionEntry,
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let Some(key) = state.active_session(user_id, old_token) else {
            return Ok(false);
        };
        state.sessions.remove(&key);
        state.sessions.insert(
            SessionEntry::document_id(&new_session.refresh_token),
            new_session.clone(),
        );
        Ok(true)
    }

    async fn remove_session(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        match state.active_session(user_id, refresh_token) {
            Some(key) => {
                state.sessions.remove(&key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionEntry>, AppError> {
        let state = self.lock()?;
        let mut sessions: Vec<SessionEntry> = state
            .sessions
            .values()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    // ─── Playlists ───────────────────────────────────────────────

    async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, AppError> {
        Ok(self.lock()?.playlists.get(playlist_id).cloned())
    }

    async fn list_playlists(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError> {
        let state = self.lock()?;
        let mut playlists: Vec<Playlist> = state
            .playlists
            .values()
            .filter(|p| p.created_by == owner_id)
            .cloned()
            .collect();
        playlists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(playlists)
    }

    async fn insert_playlist(
        &self,
        playlist: &Playlist,
        videos: &[Video],
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        if state.playlists.contains_key(&playlist.id) {
            return Ok(false);
        }
        state.playlists.insert(playlist.id.clone(), playlist.clone());
        for video in videos {
            state.videos.insert(video.id.clone(), video.clone());
        }
        Ok(true)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<Option<usize>, AppError> {
        let mut state = self.lock()?;
        if state.playlists.remove(playlist_id).is_none() {
            return Ok(None);
        }
        let before = state.videos.len();
        state.videos.retain(|_, v| v.in_playlist != playlist_id);
        Ok(Some(before - state.videos.len()))
    }

    // ─── Videos ──────────────────────────────────────────────────

    async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        Ok(self.lock()?.videos.get(video_id).cloned())
    }

    async fn list_videos(&self, playlist_id: &str) -> Result<Vec<Video>, AppError> {
        let state = self.lock()?;
        let mut videos: Vec<Video> = state
            .videos
            .values()
            .filter(|v| v.in_playlist == playlist_id)
            .cloned()
            .collect();
        videos.sort_by_key(|v| v.order);
        Ok(videos)
    }

    async fn update_video(
        &self,
        video_id: &str,
        patch: &VideoPatch,
    ) -> Result<Option<Video>, AppError> {
        let mut state = self.lock()?;
        let Some(video) = state.videos.get_mut(video_id) else {
            return Ok(None);
        };
        let delta = patch.apply(video);
        let video = video.clone();
        state.adjust_playlist(&video.in_playlist, delta);
        Ok(Some(video))
    }

    async fn delete_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        let mut state = self.lock()?;
        let Some(removed) = state.videos.remove(video_id) else {
            return Ok(None);
        };
        state.adjust_playlist(&removed.in_playlist, CounterDelta::removal(&removed));
        video::close_gap(
            state
                .videos
                .values_mut()
                .filter(|v| v.in_playlist == removed.in_playlist),
            removed.order,
        );
        Ok(Some(removed))
    }

    // ─── Events ──────────────────────────────────────────────────

    async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        self.lock()?.events.insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        Ok(self.lock()?.events.get(event_id).cloned())
    }

    async fn list_events(&self, owner_id: &str) -> Result<Vec<Event>, AppError> {
        let state = self.lock()?;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.created_by == owner_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(events)
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, AppError> {
        Ok(self.lock()?.events.remove(event_id).is_some())
    }

    // ─── Notes ───────────────────────────────────────────────────

    async fn insert_note(&self, note: &Note) -> Result<(), AppError> {
        self.lock()?.notes.insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn get_note(&self, note_id: &str) -> Result<Option<Note>, AppError> {
        Ok(self.lock()?.notes.get(note_id).cloned())
    }

    async fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>, AppError> {
        let state = self.lock()?;
        let mut notes: Vec<Note> = state
            .notes
            .values()
            .filter(|n| n.created_by == owner_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn list_notes_for_video(
        &self,
        owner_id: &str,
        video_id: &str,
    ) -> Result<Vec<Note>, AppError> {
        let state = self.lock()?;
        let mut notes: Vec<Note> = state
            .notes
            .values()
            .filter(|n| n.created_by == owner_id && n.in_video.as_deref() == Some(video_id))
            .cloned()
            .collect();
        sort_by_timestamp(&mut notes);
        Ok(notes)
    }

    async fn update_note(
        &self,
        note_id: &str,
        patch: &NotePatch,
        now: &str,
    ) -> Result<Option<Note>, AppError> {
        let mut state = self.lock()?;
        Ok(state.notes.get_mut(note_id).map(|note| {
            patch.apply(note, now);
            note.clone()
        }))
    }

    async fn delete_note(&self, note_id: &str) -> Result<bool, AppError> {
        Ok(self.lock()?.notes.remove(note_id).is_some())
    }
}
