// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playlist Tracker: study YouTube playlists and track progress
//!
//! This crate provides the backend API: Google sign-in with per-device
//! sessions, playlist import from YouTube, completion tracking, calendar
//! scheduling, and notes.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use config::Config;
use db::Store;
use services::{
    CalendarBridge, CalendarProvider, CatalogImporter, CatalogProvider, CredentialStore,
    IdentityProvider, NotesService, SessionIssuer, VideoStateTracker,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
    pub credentials: CredentialStore,
    pub sessions: SessionIssuer,
    pub importer: CatalogImporter,
    pub tracker: VideoStateTracker,
    pub calendar: CalendarBridge,
    pub notes: NotesService,
    cookie_key: Key,
}

impl AppState {
    /// Wire up every service over one store and the external providers.
    pub fn new(
        config: Config,
        db: Arc<dyn Store>,
        identity: Arc<dyn IdentityProvider>,
        catalog: Arc<dyn CatalogProvider>,
        calendar: Arc<dyn CalendarProvider>,
    ) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone()),
            sessions: SessionIssuer::new(&config, db.clone()),
            importer: CatalogImporter::new(db.clone(), catalog),
            tracker: VideoStateTracker::new(db.clone()),
            calendar: CalendarBridge::new(&config, db.clone(), identity.clone(), calendar),
            notes: NotesService::new(db.clone()),
            cookie_key: config.cookie_key(),
            identity,
            db,
            config,
        }
    }
}

/// Signing key for the session cookie, extractable from [`AppState`].
#[derive(Clone)]
pub struct SessionCookieKey(Key);

impl FromRef<Arc<AppState>> for SessionCookieKey {
    fn from_ref(state: &Arc<AppState>) -> Self {
        SessionCookieKey(state.cookie_key.clone())
    }
}

impl From<SessionCookieKey> for Key {
    fn from(key: SessionCookieKey) -> Self {
        key.0
    }
}
