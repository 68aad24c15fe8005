// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: users, their Google token, and their session set.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{SessionEntry, User, UserProfile};
use crate::services::session::IdentityClaim;
use crate::services::current_user;
use crate::time_utils::format_utc_rfc3339;
use std::sync::Arc;

/// Everything a successful external login contributes.
#[derive(Debug, Clone)]
pub struct LoginRecord<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub picture: Option<&'a str>,
    /// Absent when Google did not issue a new long-lived token.
    pub google_refresh_token: Option<&'a str>,
    pub calendar_access: bool,
    /// Session refresh token for the logging-in device
    pub session_token: &'a str,
}

/// Result of revoking one session entry.
#[derive(Debug)]
pub enum RevokeOutcome {
    Revoked(User),
    UserNotFound,
    /// The token is not in the user's active set.
    InvalidToken,
}

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn Store>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.store.find_user_by_email(email).await
    }

    /// Record a login, creating the user on first login.
    ///
    /// Existing session entries are never removed. Returns the user and
    /// whether it was created by this call.
    pub async fn record_login(&self, login: &LoginRecord<'_>) -> Result<(User, bool), AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());
        let user_id = User::id_for_email(login.email);
        let session = SessionEntry {
            user_id: user_id.clone(),
            refresh_token: login.session_token.to_string(),
            created_at: now.clone(),
        };

        if let Some(user) = self.returning_login(&user_id, &session, login, &now).await? {
            return Ok((user, false));
        }

        let google_refresh_token = login.google_refresh_token.ok_or_else(|| {
            AppError::Provider("Google did not issue a refresh token on first login".to_string())
        })?;

        let user = User {
            id: user_id.clone(),
            email: login.email.to_string(),
            name: login.name.to_string(),
            image: login.picture.map(str::to_string),
            google_refresh_token: google_refresh_token.to_string(),
            calendar_access: login.calendar_access,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        if self.store.create_user(&user, &session).await? {
            tracing::info!(user_id = %user.id, calendar_access = user.calendar_access, "New user");
            return Ok((user, true));
        }

        // Lost a race with a concurrent first login: join the existing record.
        self.returning_login(&user_id, &session, login, &now)
            .await?
            .map(|user| (user, false))
            .ok_or_else(|| AppError::Database(format!("User {} vanished during login", user_id)))
    }

    async fn returning_login(
        &self,
        user_id: &str,
        session: &SessionEntry,
        login: &LoginRecord<'_>,
        now: &str,
    ) -> Result<Option<User>, AppError> {
        let user = self
            .store
            .record_returning_login(
                user_id,
                session,
                login.calendar_access,
                login.google_refresh_token,
                now,
            )
            .await?;

        if let Some(user) = &user {
            tracing::info!(
                user_id = %user.id,
                calendar_access = user.calendar_access,
                google_token_replaced = login.google_refresh_token.is_some(),
                "Returning user login"
            );
        }
        Ok(user)
    }

    /// Remove exactly the entry holding `session_token`.
    pub async fn revoke_session(
        &self,
        email: &str,
        session_token: &str,
    ) -> Result<RevokeOutcome, AppError> {
        let Some(user) = self.find_user_by_email(email).await? else {
            return Ok(RevokeOutcome::UserNotFound);
        };

        if self.store.remove_session(&user.id, session_token).await? {
            Ok(RevokeOutcome::Revoked(user))
        } else {
            Ok(RevokeOutcome::InvalidToken)
        }
    }

    // ─── Profile ─────────────────────────────────────────────────

    pub async fn get_profile(&self, claim: &IdentityClaim) -> Result<UserProfile, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        Ok(UserProfile::from(&user))
    }

    /// Change display name and avatar. Inputs are validated by the caller.
    pub async fn update_profile(
        &self,
        claim: &IdentityClaim,
        name: &str,
        image: &str,
    ) -> Result<UserProfile, AppError> {
        let user = current_user(self.store.as_ref(), claim).await?;
        let now = format_utc_rfc3339(chrono::Utc::now());
        let updated = self
            .store
            .update_profile(&user.id, name.trim(), image, &now)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        Ok(UserProfile::from(&updated))
    }
}
