// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use playlist_tracker::config::Config;
use playlist_tracker::db::{FirestoreDb, MemoryDb, Store};
use playlist_tracker::error::AppError;
use playlist_tracker::models::{
    Event, Note, NotePatch, Playlist, SessionEntry, User, Video, VideoPatch,
};
use playlist_tracker::routes::create_router;
use playlist_tracker::services::google_calendar::CalendarEventRequest;
use playlist_tracker::services::google_oauth::CALENDAR_SCOPE;
use playlist_tracker::services::youtube::{CatalogItem, CatalogPlaylist, ItemPage};
use playlist_tracker::services::{
    CalendarProvider, CatalogProvider, GoogleGrant, GoogleIdentity, IdentityClaim,
    IdentityProvider, IssuedTokens, LoginRecord,
};
use playlist_tracker::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ─── Fake Providers ──────────────────────────────────────────────

/// Identity provider that answers from registered authorization codes.
#[derive(Default)]
pub struct FakeIdentity {
    grants: Mutex<HashMap<String, GoogleGrant>>,
    /// Refresh tokens `access_token` was called with
    pub access_requests: Mutex<Vec<String>>,
}

impl FakeIdentity {
    /// Register `code` as a login for `email`.
    pub fn register(
        &self,
        code: &str,
        email: &str,
        google_refresh_token: Option<&str>,
        calendar: bool,
    ) {
        let mut scopes = vec!["openid".to_string(), "email".to_string()];
        if calendar {
            scopes.push(CALENDAR_SCOPE.to_string());
        }
        let grant = GoogleGrant {
            refresh_token: google_refresh_token.map(str::to_string),
            identity: GoogleIdentity {
                email: email.to_string(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                picture: Some(format!("https://example.com/{}.png", email)),
            },
            scopes,
        };
        self.grants.lock().unwrap().insert(code.to_string(), grant);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn exchange_code(&self, code: &str) -> Result<GoogleGrant, AppError> {
        self.grants
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::Provider("invalid_grant".to_string()))
    }

    async fn access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        self.access_requests
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        Ok(format!("access-for-{}", refresh_token))
    }
}

/// Catalog serving generated playlists in fixed-size pages.
#[derive(Default)]
pub struct FakeCatalog {
    playlists: Mutex<HashMap<String, (CatalogPlaylist, Vec<Vec<CatalogItem>>)>>,
    /// Zero-based page index that fails with a provider error
    pub fail_on_page: Mutex<Option<usize>>,
    pub page_requests: Mutex<usize>,
}

impl FakeCatalog {
    /// Add a playlist with `count` items at positions `0..count`.
    pub fn add_playlist(&self, id: &str, count: u32, page_size: usize) {
        let items: Vec<CatalogItem> = (0..count)
            .map(|position| CatalogItem {
                video_id: format!("{}-v{}", id, position),
                title: format!("Video {}", position),
                description: format!("Description {}", position),
                position,
                thumbnail: format!("https://i.ytimg.com/{}/{}.jpg", id, position),
            })
            .collect();
        let pages = if items.is_empty() {
            vec![Vec::new()]
        } else {
            items.chunks(page_size).map(<[CatalogItem]>::to_vec).collect()
        };
        self.add_pages(id, count, pages);
    }

    /// Add a playlist with explicit pages.
    pub fn add_pages(&self, id: &str, reported_count: u32, pages: Vec<Vec<CatalogItem>>) {
        let playlist = CatalogPlaylist {
            playlist_id: id.to_string(),
            title: format!("Playlist {}", id),
            description: "A test playlist".to_string(),
            item_count: reported_count,
            thumbnail: Some(format!("https://i.ytimg.com/{}/cover.jpg", id)),
        };
        self.playlists
            .lock()
            .unwrap()
            .insert(id.to_string(), (playlist, pages));
    }

    pub fn fail_on_page(&self, page: usize) {
        *self.fail_on_page.lock().unwrap() = Some(page);
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn playlist(&self, playlist_id: &str) -> Result<Option<CatalogPlaylist>, AppError> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .get(playlist_id)
            .map(|(p, _)| p.clone()))
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<ItemPage, AppError> {
        *self.page_requests.lock().unwrap() += 1;

        let index = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| AppError::Provider(format!("bad page token {}", token)))?,
        };
        if *self.fail_on_page.lock().unwrap() == Some(index) {
            return Err(AppError::Provider("quotaExceeded".to_string()));
        }

        let playlists = self.playlists.lock().unwrap();
        let (_, pages) = playlists
            .get(playlist_id)
            .ok_or_else(|| AppError::Provider("playlistNotFound".to_string()))?;
        let items = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
        Ok(ItemPage {
            items,
            next_page_token,
        })
    }
}

/// Calendar that records created and deleted events.
#[derive(Default)]
pub struct FakeCalendar {
    pub created: Mutex<Vec<(String, CalendarEventRequest)>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn create_event(
        &self,
        access_token: &str,
        event: &CalendarEventRequest,
    ) -> Result<String, AppError> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::Provider("calendar unavailable".to_string()));
        }
        let mut created = self.created.lock().unwrap();
        let id = format!("gcal-{}", created.len() + 1);
        created.push((access_token.to_string(), event.clone()));
        Ok(id)
    }

    async fn delete_event(&self, _access_token: &str, event_id: &str) -> Result<(), AppError> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::Provider("calendar unavailable".to_string()));
        }
        self.deleted.lock().unwrap().push(event_id.to_string());
        Ok(())
    }
}

// ─── Failing Store ───────────────────────────────────────────────

/// In-memory store whose event writes always fail.
#[derive(Default)]
pub struct EventWriteFailingStore {
    pub inner: MemoryDb,
}

#[async_trait]
impl Store for EventWriteFailingStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.inner.get_user(user_id).await
    }

    async fn create_user(&self, user: &User, session: &SessionEntry) -> Result<bool, AppError> {
        self.inner.create_user(user, session).await
    }

    async fn record_returning_login(
        &self,
        user_id: &str,
        session: &SessionEntry,
        calendar_access: bool,
        google_refresh_token: Option<&str>,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        self.inner
            .record_returning_login(user_id, session, calendar_access, google_refresh_token, now)
            .await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        name: &str,
        image: &str,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        self.inner.update_profile(user_id, name, image, now).await
    }

    async fn session_active(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError> {
        self.inner.session_active(user_id, refresh_token).await
    }

    async fn rotate_session(
        &self,
        user_id: &str,
        old_token: &str,
        new_session: &SessionEntry,
    ) -> Result<bool, AppError> {
        self.inner.rotate_session(user_id, old_token, new_session).await
    }

    async fn remove_session(&self, user_id: &str, refresh_token: &str) -> Result<bool, AppError> {
        self.inner.remove_session(user_id, refresh_token).await
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionEntry>, AppError> {
        self.inner.list_sessions(user_id).await
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, AppError> {
        self.inner.get_playlist(playlist_id).await
    }

    async fn list_playlists(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError> {
        self.inner.list_playlists(owner_id).await
    }

    async fn insert_playlist(
        &self,
        playlist: &Playlist,
        videos: &[Video],
    ) -> Result<bool, AppError> {
        self.inner.insert_playlist(playlist, videos).await
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<Option<usize>, AppError> {
        self.inner.delete_playlist(playlist_id).await
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        self.inner.get_video(video_id).await
    }

    async fn list_videos(&self, playlist_id: &str) -> Result<Vec<Video>, AppError> {
        self.inner.list_videos(playlist_id).await
    }

    async fn update_video(
        &self,
        video_id: &str,
        patch: &VideoPatch,
    ) -> Result<Option<Video>, AppError> {
        self.inner.update_video(video_id, patch).await
    }

    async fn delete_video(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        self.inner.delete_video(video_id).await
    }

    async fn insert_event(&self, _event: &Event) -> Result<(), AppError> {
        Err(AppError::Database("event write rejected".to_string()))
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        self.inner.get_event(event_id).await
    }

    async fn list_events(&self, owner_id: &str) -> Result<Vec<Event>, AppError> {
        self.inner.list_events(owner_id).await
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool, AppError> {
        self.inner.delete_event(event_id).await
    }

    async fn insert_note(&self, note: &Note) -> Result<(), AppError> {
        self.inner.insert_note(note).await
    }

    async fn get_note(&self, note_id: &str) -> Result<Option<Note>, AppError> {
        self.inner.get_note(note_id).await
    }

    async fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>, AppError> {
        self.inner.list_notes(owner_id).await
    }

    async fn list_notes_for_video(
        &self,
        owner_id: &str,
        video_id: &str,
    ) -> Result<Vec<Note>, AppError> {
        self.inner.list_notes_for_video(owner_id, video_id).await
    }

    async fn update_note(
        &self,
        note_id: &str,
        patch: &NotePatch,
        now: &str,
    ) -> Result<Option<Note>, AppError> {
        self.inner.update_note(note_id, patch, now).await
    }

    async fn delete_note(&self, note_id: &str) -> Result<bool, AppError> {
        self.inner.delete_note(note_id).await
    }
}

// ─── Test App ────────────────────────────────────────────────────

pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub identity: Arc<FakeIdentity>,
    pub catalog: Arc<FakeCatalog>,
    pub calendar: Arc<FakeCalendar>,
}

/// Create a test app over the in-memory store and fake providers.
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

pub fn create_test_app_with_config(config: Config) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let identity = Arc::new(FakeIdentity::default());
    let catalog = Arc::new(FakeCatalog::default());
    let calendar = Arc::new(FakeCalendar::default());

    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        identity.clone(),
        catalog.clone(),
        calendar.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        identity,
        catalog,
        calendar,
    }
}

impl TestApp {
    /// Create a user directly through the services, returning the claim and
    /// the device's tokens.
    pub async fn seed_user(&self, email: &str, calendar: bool) -> (IdentityClaim, IssuedTokens) {
        let claim = IdentityClaim {
            email: email.to_string(),
        };
        let tokens = self.state.sessions.issue_tokens(&claim).unwrap();
        self.state
            .credentials
            .record_login(&LoginRecord {
                email,
                name: "Test User",
                picture: None,
                google_refresh_token: Some(&format!("google-{}", email)),
                calendar_access: calendar,
                session_token: &tokens.refresh_token,
            })
            .await
            .unwrap();
        (claim, tokens)
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a JSON request with an optional access token.
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

/// Read a response body as JSON (`Null` when empty).
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// All Set-Cookie headers of a response.
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The full Set-Cookie header for `name`.
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// The `name=value` pair of a Set-Cookie header, ready for a Cookie header.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}
