// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::ids::digest_hex;
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Digest of the email (also used as document ID)
    pub id: String,
    /// Google account email, unique across users
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL
    pub image: Option<String>,
    /// Long-lived Google refresh token, used for Calendar calls
    pub google_refresh_token: String,
    /// Whether the calendar scope was granted at the last login
    pub calendar_access: bool,
    /// When the user first logged in (ISO 8601)
    pub created_at: String,
    /// Last profile/credential change (ISO 8601)
    pub updated_at: String,
}

impl User {
    /// Document ID for the user with this email.
    ///
    /// Keying users by their email makes a second record for the same email
    /// impossible at the storage level.
    pub fn id_for_email(email: &str) -> String {
        digest_hex(email)
    }
}

/// One logged-in device's session refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Owning user's ID
    pub user_id: String,
    /// The session refresh token as handed to the device
    pub refresh_token: String,
    /// When this entry was created (ISO 8601)
    pub created_at: String,
}

impl SessionEntry {
    /// Document ID for the entry holding this token.
    pub fn document_id(refresh_token: &str) -> String {
        digest_hex(refresh_token)
    }
}

/// Public view of a user, without credentials.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub calendar_access: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            calendar_access: user.calendar_access,
        }
    }
}
