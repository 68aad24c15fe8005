// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar bridge: study-session events on the user's Google Calendar.
//!
//! Calls are authenticated with the user's stored Google refresh token,
//! never with our own session credentials. Each provider event has a local
//! mirror so deletion can be authorized and looked up without the provider.

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::ids;
use crate::models::Event;
use crate::services::current_user;
use crate::services::google_calendar::{
    CalendarEventRequest, CalendarProvider, EventSource, EventTime, EVENT_COLOR_ID,
};
use crate::services::google_oauth::IdentityProvider;
use crate::services::session::IdentityClaim;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Input for a new calendar event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub struct CalendarBridge {
    store: Arc<dyn Store>,
    identity: Arc<dyn IdentityProvider>,
    calendar: Arc<dyn CalendarProvider>,
    source: EventSource,
}

impl CalendarBridge {
    pub fn new(
        config: &Config,
        store: Arc<dyn Store>,
        identity: Arc<dyn IdentityProvider>,
        calendar: Arc<dyn CalendarProvider>,
    ) -> Self {
        Self {
            store,
            identity,
            calendar,
            source: EventSource {
                url: config.event_source_url.clone(),
                title: config.event_source_title.clone(),
            },
        }
    }

    /// Create an event on the caller's primary calendar and mirror it.
    pub async fn create_event(
        &self,
        claim: &IdentityClaim,
        event: NewEvent,
    ) -> Result<Event, AppError> {
        if event.end <= event.start {
            return Err(AppError::BadRequest(
                "Event end must be after its start".to_string(),
            ));
        }

        let user = current_user(self.store.as_ref(), claim).await?;
        if !user.calendar_access {
            return Err(AppError::NoCalendarAccess);
        }

        let start = format_utc_rfc3339(event.start);
        let end = format_utc_rfc3339(event.end);
        let request = CalendarEventRequest {
            summary: event.summary.clone(),
            description: event.description.clone(),
            start: EventTime {
                date_time: start.clone(),
            },
            end: EventTime {
                date_time: end.clone(),
            },
            source: self.source.clone(),
            color_id: EVENT_COLOR_ID.to_string(),
        };

        let access_token = self.identity.access_token(&user.google_refresh_token).await?;
        let event_id = self.calendar.create_event(&access_token, &request).await?;

        let mirror = Event {
            id: ids::new_document_id(),
            event_id,
            summary: event.summary,
            description: event.description,
            start,
            end,
            created_by: user.id.clone(),
            created_at: format_utc_rfc3339(Utc::now()),
        };

        if let Err(e) = self.store.insert_event(&mirror).await {
            tracing::error!(
                user_id = %user.id,
                event_id = %mirror.event_id,
                error = %e,
                "Failed to store calendar event mirror, removing provider event"
            );
            // An event without a mirror could never be deleted through us.
            if let Err(cleanup) = self
                .calendar
                .delete_event(&access_token, &mirror.event_id)
                .await
            {
                tracing::error!(
                    user_id = %user.id,
                    event_id = %mirror.event_id,
                    error = %cleanup,
                    "Failed to remove untracked calendar event"
                );
            }
            return Err(e);
        }

        tracing::info!(user_id = %user.id, event_id = %mirror.event_id, "Calendar event created");
        Ok(mirror)
    }

    /// Delete an event from the provider, then its local mirror.
    pub async fn delete_event(&self, claim: &IdentityClaim, id: &str) -> Result<Event, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        let event = self
            .store
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", id)))?;
        if event.created_by != user.id {
            return Err(AppError::Forbidden("Event belongs to another user".to_string()));
        }

        let access_token = self.identity.access_token(&user.google_refresh_token).await?;
        self.calendar
            .delete_event(&access_token, &event.event_id)
            .await?;
        self.store.delete_event(id).await?;

        tracing::info!(user_id = %user.id, event_id = %event.event_id, "Calendar event deleted");
        Ok(event)
    }

    /// The caller's mirrored events by start time.
    pub async fn list_events(&self, claim: &IdentityClaim) -> Result<Vec<Event>, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        self.store.list_events(&user.id).await
    }
}
