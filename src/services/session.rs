// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session issuer: access tokens and per-device session refresh tokens.
//!
//! Each device moves through `Anonymous -> Authenticated -> Refreshed* ->
//! Revoked`. A session refresh token is only honoured while its entry is in
//! the owning user's active set; refreshing swaps that one entry for a
//! freshly issued token, so a token can be used at most once.

use crate::config::Config;
use crate::db::Store;
use crate::error::{AppError, AuthFailure};
use crate::ids;
use crate::models::{SessionEntry, User};
use crate::services::credentials::{CredentialStore, RevokeOutcome};
use crate::time_utils::format_utc_rfc3339;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Access token lifetime (1 day).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Session refresh token lifetime (30 days).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// The authenticated identity a request acts as.
///
/// Passed explicitly into every core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub email: String,
}

/// JWT claims for both token kinds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Random token ID, so tokens minted in the same second still differ
    pub jti: String,
}

/// Freshly issued credentials for one device.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the refresh token, for the cookie's Max-Age.
    pub refresh_max_age_secs: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Mints, verifies, rotates and revokes session credentials.
pub struct SessionIssuer {
    store: Arc<dyn Store>,
    credentials: CredentialStore,
    access: SigningKeys,
    refresh: SigningKeys,
}

impl SessionIssuer {
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        Self {
            credentials: CredentialStore::new(store.clone()),
            store,
            access: SigningKeys::new(&config.jwt_access_key),
            refresh: SigningKeys::new(&config.jwt_refresh_key),
        }
    }

    /// Sign a new access token and session refresh token for `claim`.
    ///
    /// Nothing is stored; the caller records the refresh token.
    pub fn issue_tokens(&self, claim: &IdentityClaim) -> Result<IssuedTokens, AppError> {
        let now = chrono::Utc::now().timestamp();
        Ok(IssuedTokens {
            access_token: sign(&self.access, claim, now, ACCESS_TOKEN_TTL_SECS)?,
            refresh_token: sign(&self.refresh, claim, now, REFRESH_TOKEN_TTL_SECS)?,
            refresh_max_age_secs: REFRESH_TOKEN_TTL_SECS,
        })
    }

    /// Verify an access token's signature and expiry.
    pub fn verify_access(&self, token: &str) -> Result<IdentityClaim, AppError> {
        verify(&self.access, token)
    }

    /// Verify a session refresh token's signature and expiry.
    ///
    /// Does not check membership in the active set.
    pub fn verify_refresh(&self, token: &str) -> Result<IdentityClaim, AppError> {
        verify(&self.refresh, token)
    }

    /// Exchange an active session refresh token for new credentials.
    ///
    /// The presented token is replaced by the new one in the user's active
    /// set; other devices are untouched.
    pub async fn refresh(
        &self,
        presented: Option<&str>,
    ) -> Result<(IdentityClaim, IssuedTokens), AppError> {
        let presented = presented.ok_or(AppError::Unauthenticated(AuthFailure::MissingCredential))?;
        let claim = self.verify_refresh(presented)?;
        let user = self.owning_user(&claim).await?;

        let tokens = self.issue_tokens(&claim)?;
        let entry = SessionEntry {
            user_id: user.id.clone(),
            refresh_token: tokens.refresh_token.clone(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        if !self.store.rotate_session(&user.id, presented, &entry).await? {
            tracing::warn!(user_id = %user.id, "Refresh with inactive session token");
            return Err(AppError::Unauthenticated(AuthFailure::NotActive));
        }

        tracing::debug!(user_id = %user.id, "Session rotated");
        Ok((claim, tokens))
    }

    /// End the presenting device's session.
    ///
    /// The refresh token must belong to the same identity as the access
    /// token. Returns the user whose session was removed.
    pub async fn revoke(
        &self,
        presented: Option<&str>,
        claim: &IdentityClaim,
    ) -> Result<User, AppError> {
        let presented = presented.ok_or(AppError::Unauthenticated(AuthFailure::MissingCredential))?;
        let refresh_claim = self.verify_refresh(presented)?;
        if refresh_claim != *claim {
            return Err(AppError::Unauthenticated(AuthFailure::ClaimMismatch));
        }

        match self
            .credentials
            .revoke_session(&claim.email, presented)
            .await?
        {
            RevokeOutcome::Revoked(user) => {
                tracing::info!(user_id = %user.id, "Session revoked");
                Ok(user)
            }
            RevokeOutcome::UserNotFound => Err(AppError::Unauthenticated(AuthFailure::UnknownUser)),
            RevokeOutcome::InvalidToken => Err(AppError::Unauthenticated(AuthFailure::NotActive)),
        }
    }

    async fn owning_user(&self, claim: &IdentityClaim) -> Result<User, AppError> {
        self.credentials
            .find_user_by_email(&claim.email)
            .await?
            .ok_or(AppError::Unauthenticated(AuthFailure::UnknownUser))
    }
}

fn sign(keys: &SigningKeys, claim: &IdentityClaim, now: i64, ttl: i64) -> Result<String, AppError> {
    let claims = TokenClaims {
        email: claim.email.clone(),
        iat: now,
        exp: now + ttl,
        jti: ids::random_hex(16),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
}

fn verify(keys: &SigningKeys, token: &str) -> Result<IdentityClaim, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<TokenClaims>(token, &keys.decoding, &validation)
        .map(|data| IdentityClaim {
            email: data.claims.email,
        })
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::Unauthenticated(AuthFailure::Expired),
            _ => AppError::Unauthenticated(AuthFailure::BadSignature),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(&Config::test_default(), Arc::new(MemoryDb::new()))
    }

    fn claim() -> IdentityClaim {
        IdentityClaim {
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_access_and_refresh_keys_are_not_interchangeable() {
        let issuer = issuer();
        let tokens = issuer.issue_tokens(&claim()).unwrap();

        assert_eq!(issuer.verify_access(&tokens.access_token).unwrap(), claim());
        assert_eq!(issuer.verify_refresh(&tokens.refresh_token).unwrap(), claim());

        assert!(matches!(
            issuer.verify_access(&tokens.refresh_token),
            Err(AppError::Unauthenticated(AuthFailure::BadSignature))
        ));
        assert!(matches!(
            issuer.verify_refresh(&tokens.access_token),
            Err(AppError::Unauthenticated(AuthFailure::BadSignature))
        ));
    }

    #[test]
    fn test_tokens_issued_together_differ() {
        let issuer = issuer();
        let a = issuer.issue_tokens(&claim()).unwrap();
        let b = issuer.issue_tokens(&claim()).unwrap();
        assert_ne!(a.refresh_token, b.refresh_token);
        assert_ne!(a.access_token, b.access_token);
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let issuer = issuer();
        let now = chrono::Utc::now().timestamp();
        let token = sign(&issuer.access, &claim(), now - 100, 10).unwrap();
        assert!(matches!(
            issuer.verify_access(&token),
            Err(AppError::Unauthenticated(AuthFailure::Expired))
        ));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let issuer = issuer();
        let tokens = issuer.issue_tokens(&claim()).unwrap();
        let mut tampered = tokens.access_token.clone();
        tampered.push('x');
        assert!(matches!(
            issuer.verify_access(&tampered),
            Err(AppError::Unauthenticated(AuthFailure::BadSignature))
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_credential() {
        let result = issuer().refresh(None).await;
        assert!(matches!(
            result,
            Err(AppError::Unauthenticated(AuthFailure::MissingCredential))
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_unknown_user() {
        let issuer = issuer();
        let tokens = issuer.issue_tokens(&claim()).unwrap();
        let result = issuer.refresh(Some(&tokens.refresh_token)).await;
        assert!(matches!(
            result,
            Err(AppError::Unauthenticated(AuthFailure::UnknownUser))
        ));
    }

    #[tokio::test]
    async fn test_revoke_with_other_identity() {
        let issuer = issuer();
        let tokens = issuer.issue_tokens(&claim()).unwrap();
        let other = IdentityClaim {
            email: "eve@example.com".to_string(),
        };
        let result = issuer.revoke(Some(&tokens.refresh_token), &other).await;
        assert!(matches!(
            result,
            Err(AppError::Unauthenticated(AuthFailure::ClaimMismatch))
        ));
    }
}
