// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar event bridge tests against a recording calendar provider.

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use playlist_tracker::config::Config;
use playlist_tracker::db::Store;
use playlist_tracker::error::AppError;
use playlist_tracker::services::{
    CalendarBridge, CredentialStore, IdentityClaim, LoginRecord, NewEvent,
};
use serde_json::json;
use std::sync::Arc;

mod common;
use common::{EventWriteFailingStore, FakeCalendar, FakeIdentity};

fn event_body() -> serde_json::Value {
    json!({
        "summary": "Watch lecture 3",
        "description": "Linear algebra",
        "start": "2026-03-01T10:00:00Z",
        "end": "2026-03-01T11:00:00Z",
    })
}

#[tokio::test]
async fn test_create_event_mirrors_provider_event() {
    let app = common::create_test_app();
    let (_, tokens) = app.seed_user("ada@example.com", true).await;

    let (status, event) = app
        .call("POST", "/api/events", Some(&tokens.access_token), Some(event_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["event_id"], "gcal-1");
    assert_eq!(event["summary"], "Watch lecture 3");
    assert_eq!(event["start"], "2026-03-01T10:00:00Z");
    assert_eq!(event["end"], "2026-03-01T11:00:00Z");

    let created = app.calendar.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    let (access_token, request) = &created[0];
    assert_eq!(access_token, "access-for-google-ada@example.com");
    assert_eq!(request.color_id, "6");
    assert_eq!(request.start.date_time, "2026-03-01T10:00:00Z");
    assert_eq!(request.source.title, "Playlist Tracker");

    let (status, list) = app
        .call("GET", "/api/events", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_event_requires_calendar_access() {
    let app = common::create_test_app();
    let (_, tokens) = app.seed_user("ada@example.com", false).await;

    let (status, body) = app
        .call("POST", "/api/events", Some(&tokens.access_token), Some(event_body()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "no_calendar_access");
    assert!(app.calendar.created.lock().unwrap().is_empty());
    assert!(app.identity.access_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_end_before_start_is_rejected() {
    let app = common::create_test_app();
    let (_, tokens) = app.seed_user("ada@example.com", true).await;

    let mut body = event_body();
    body["end"] = json!("2026-03-01T09:00:00Z");
    let (status, _) = app
        .call("POST", "/api/events", Some(&tokens.access_token), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = event_body();
    body["end"] = body["start"].clone();
    let (status, _) = app
        .call("POST", "/api/events", Some(&tokens.access_token), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.calendar.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_failure_on_create_stores_nothing() {
    let app = common::create_test_app();
    let (claim, tokens) = app.seed_user("ada@example.com", true).await;
    *app.calendar.fail.lock().unwrap() = true;

    let (status, body) = app
        .call("POST", "/api/events", Some(&tokens.access_token), Some(event_body()))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "provider_error");

    let user = app
        .db
        .find_user_by_email(&claim.email)
        .await
        .unwrap()
        .unwrap();
    assert!(app.db.list_events(&user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_mirror_write_removes_provider_event() {
    let store = Arc::new(EventWriteFailingStore::default());
    let identity = Arc::new(FakeIdentity::default());
    let calendar = Arc::new(FakeCalendar::default());
    let bridge = CalendarBridge::new(
        &Config::test_default(),
        store.clone(),
        identity,
        calendar.clone(),
    );

    CredentialStore::new(store.clone())
        .record_login(&LoginRecord {
            email: "ada@example.com",
            name: "Ada",
            picture: None,
            google_refresh_token: Some("google-ada"),
            calendar_access: true,
            session_token: "session-1",
        })
        .await
        .unwrap();
    let claim = IdentityClaim {
        email: "ada@example.com".to_string(),
    };

    let result = bridge
        .create_event(
            &claim,
            NewEvent {
                summary: "Watch lecture 3".to_string(),
                description: String::new(),
                start: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2026, 3, 1, 11, 0, 0).unwrap(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Database(_))));
    assert_eq!(calendar.created.lock().unwrap().len(), 1);
    assert_eq!(*calendar.deleted.lock().unwrap(), vec!["gcal-1".to_string()]);
}

#[tokio::test]
async fn test_delete_event() {
    let app = common::create_test_app();
    let (_, tokens) = app.seed_user("ada@example.com", true).await;

    let (_, event) = app
        .call("POST", "/api/events", Some(&tokens.access_token), Some(event_body()))
        .await;
    let id = event["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            "DELETE",
            &format!("/api/events/{id}"),
            Some(&tokens.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], id);
    assert_eq!(*app.calendar.deleted.lock().unwrap(), vec!["gcal-1".to_string()]);
    assert!(app.db.get_event(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_event_provider_failure_keeps_mirror() {
    let app = common::create_test_app();
    let (_, tokens) = app.seed_user("ada@example.com", true).await;

    let (_, event) = app
        .call("POST", "/api/events", Some(&tokens.access_token), Some(event_body()))
        .await;
    let id = event["id"].as_str().unwrap();
    *app.calendar.fail.lock().unwrap() = true;

    let (status, _) = app
        .call(
            "DELETE",
            &format!("/api/events/{id}"),
            Some(&tokens.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(app.db.get_event(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_other_users_event() {
    let app = common::create_test_app();
    let (_, ada) = app.seed_user("ada@example.com", true).await;
    let (_, bob) = app.seed_user("bob@example.com", true).await;

    let (_, event) = app
        .call("POST", "/api/events", Some(&ada.access_token), Some(event_body()))
        .await;
    let id = event["id"].as_str().unwrap();

    let (status, _) = app
        .call(
            "DELETE",
            &format!("/api/events/{id}"),
            Some(&bob.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.calendar.deleted.lock().unwrap().is_empty());
    assert!(app.db.get_event(id).await.unwrap().is_some());

    let (_, list) = app
        .call("GET", "/api/events", Some(&bob.access_token), None)
        .await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_delete_unknown_event() {
    let app = common::create_test_app();
    let (_, tokens) = app.seed_user("ada@example.com", true).await;

    let (status, _) = app
        .call("DELETE", "/api/events/nope", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_events_listed_by_start() {
    let app = common::create_test_app();
    let (_, tokens) = app.seed_user("ada@example.com", true).await;

    for (start, end) in [
        ("2026-03-02T10:00:00Z", "2026-03-02T11:00:00Z"),
        ("2026-03-01T10:00:00Z", "2026-03-01T11:00:00Z"),
    ] {
        let mut body = event_body();
        body["start"] = json!(start);
        body["end"] = json!(end);
        let (status, _) = app
            .call("POST", "/api/events", Some(&tokens.access_token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, list) = app
        .call("GET", "/api/events", Some(&tokens.access_token), None)
        .await;
    let starts: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["start"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["2026-03-01T10:00:00Z", "2026-03-02T10:00:00Z"]);
}
