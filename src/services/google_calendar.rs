// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar API client (primary calendar only).

use crate::config::Config;
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const EVENTS_ENDPOINT: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

/// Calendar color used for study sessions.
pub const EVENT_COLOR_ID: &str = "6";

/// Event body sent to the calendar provider.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventRequest {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub source: EventSource,
    pub color_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// RFC 3339 timestamp
    pub date_time: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventSource {
    pub url: String,
    pub title: String,
}

/// External calendar.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Create an event on the primary calendar, returning its provider id.
    async fn create_event(
        &self,
        access_token: &str,
        event: &CalendarEventRequest,
    ) -> Result<String, AppError>;

    /// Delete an event from the primary calendar. An event that is already
    /// gone is not an error.
    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

/// reqwest-backed Google Calendar client.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    events_endpoint: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            events_endpoint: EVENTS_ENDPOINT.to_string(),
        })
    }

    fn http_error(action: &str, status: reqwest::StatusCode, body: &str) -> AppError {
        if body.trim().is_empty() {
            AppError::Provider(format!("Calendar {} failed: HTTP {}", action, status.as_u16()))
        } else {
            AppError::Provider(format!(
                "Calendar {} failed: HTTP {}; body={}",
                action,
                status.as_u16(),
                body
            ))
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn create_event(
        &self,
        access_token: &str,
        event: &CalendarEventRequest,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.events_endpoint)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Calendar request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::http_error("event create", status, &body));
        }

        let created: CreatedEvent = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Unexpected calendar response: {}", e)))?;
        Ok(created.id)
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/{}",
            self.events_endpoint,
            urlencoding::encode(event_id)
        );
        let response = self
            .http
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Calendar request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            tracing::debug!(event_id, status = %status, "Calendar event already deleted");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::http_error("event delete", status, &body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_request_wire_format() {
        let request = CalendarEventRequest {
            summary: "Study".to_string(),
            description: "Chapter 3".to_string(),
            start: EventTime {
                date_time: "2026-03-01T10:00:00Z".to_string(),
            },
            end: EventTime {
                date_time: "2026-03-01T11:00:00Z".to_string(),
            },
            source: EventSource {
                url: "https://app.example.com".to_string(),
                title: "Playlist Tracker".to_string(),
            },
            color_id: EVENT_COLOR_ID.to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["colorId"], "6");
        assert_eq!(json["start"]["dateTime"], "2026-03-01T10:00:00Z");
        assert_eq!(json["source"]["title"], "Playlist Tracker");
    }
}
