// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar event routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::Event;
use crate::services::{IdentityClaim, NewEvent};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/{id}", delete(delete_event))
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.calendar.list_events(&claim).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 500))]
    pub summary: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    body.validate()?;
    let event = state
        .calendar
        .create_event(
            &claim,
            NewEvent {
                summary: body.summary,
                description: body.description,
                start: body.start,
                end: body.end,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[derive(Debug, Serialize)]
pub struct DeleteEventResponse {
    pub success: bool,
    pub id: String,
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(claim): Extension<IdentityClaim>,
    Path(id): Path<String>,
) -> Result<Json<DeleteEventResponse>> {
    let event = state.calendar.delete_event(&claim, &id).await?;
    Ok(Json(DeleteEventResponse {
        success: true,
        id: event.id,
    }))
}
