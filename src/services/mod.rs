// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod credentials;
pub mod google_calendar;
pub mod google_oauth;
pub mod importer;
pub mod notes;
pub mod session;
pub mod tracker;
pub mod youtube;

pub use calendar::{CalendarBridge, NewEvent};
pub use credentials::{CredentialStore, LoginRecord, RevokeOutcome};
pub use google_calendar::{CalendarProvider, GoogleCalendarClient};
pub use google_oauth::{GoogleGrant, GoogleIdentity, GoogleOAuthClient, IdentityProvider};
pub use importer::CatalogImporter;
pub use notes::{NewNote, NotesService};
pub use session::{IdentityClaim, IssuedTokens, SessionIssuer};
pub use tracker::VideoStateTracker;
pub use youtube::{CatalogProvider, YouTubeClient};

use crate::db::Store;
use crate::error::{AppError, AuthFailure};
use crate::models::{Playlist, User};

/// Resolve the claim to its user record.
///
/// A valid token for a user that no longer exists is an authentication
/// failure, not a missing resource.
pub(crate) async fn current_user(store: &dyn Store, claim: &IdentityClaim) -> Result<User, AppError> {
    store
        .find_user_by_email(&claim.email)
        .await?
        .ok_or(AppError::Unauthenticated(AuthFailure::UnknownUser))
}

/// Load a playlist owned by `user`.
pub(crate) async fn owned_playlist(
    store: &dyn Store,
    user: &User,
    playlist_id: &str,
) -> Result<Playlist, AppError> {
    let playlist = store
        .get_playlist(playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Playlist {}", playlist_id)))?;
    if playlist.created_by != user.id {
        return Err(AppError::Forbidden(
            "Playlist belongs to another user".to_string(),
        ));
    }
    Ok(playlist)
}
