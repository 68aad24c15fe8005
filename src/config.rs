// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables (Cloud Run secret bindings
//! in production, a `.env` file locally) and read once at startup.

use axum_extra::extract::cookie::Key;
use hkdf::Hkdf;
use sha2::Sha256;
use std::env;
use std::time::Duration;

/// Which storage backend the server should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Redirect URI registered with Google (must match the frontend's flow)
    pub google_redirect_uri: String,
    /// Frontend URL, allowed as a CORS origin
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Timeout for each outbound provider request
    pub http_timeout: Duration,
    /// Storage backend selection
    pub store_backend: StoreBackend,
    /// Source attribution attached to created calendar events
    pub event_source_url: String,
    pub event_source_title: String,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// YouTube Data API key
    pub youtube_api_key: String,
    /// JWT signing key for access tokens (raw bytes)
    pub jwt_access_key: Vec<u8>,
    /// JWT signing key for session refresh tokens (raw bytes)
    pub jwt_refresh_key: Vec<u8>,
    /// Master secret for the signed session cookie
    pub cookie_secret: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            google_redirect_uri: "http://localhost:5173/login".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            http_timeout: Duration::from_secs(10),
            store_backend: StoreBackend::Memory,
            event_source_url: "http://localhost:5173".to_string(),
            event_source_title: "Playlist Tracker".to_string(),
            google_client_secret: "test_secret".to_string(),
            youtube_api_key: "test_youtube_key".to_string(),
            jwt_access_key: b"test_access_key_32_bytes_minimum!".to_vec(),
            jwt_refresh_key: b"test_refresh_key_32_bytes_minimum".to_vec(),
            cookie_secret: b"test_cookie_secret".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from a variable lookup.
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            // Trim whitespace injected by secret bindings.
            let value = var(name).ok_or(ConfigError::Missing(name))?;
            let value = value.trim();
            if value.is_empty() {
                return Err(ConfigError::Invalid(name));
            }
            Ok(value.to_string())
        };

        let store_backend = match var("STORE_BACKEND").as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("firestore") | None => StoreBackend::Firestore,
            Some(_) => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let port = match var("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };
        let http_timeout_secs: u64 = match var("HTTP_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("HTTP_TIMEOUT_SECS"))?,
            None => 10,
        };

        let frontend_url =
            var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            google_redirect_uri: required("GOOGLE_REDIRECT_URI")?,
            gcp_project_id: var("GCP_PROJECT_ID").unwrap_or_else(|| "local-dev".to_string()),
            port,
            http_timeout: Duration::from_secs(http_timeout_secs),
            store_backend,
            event_source_url: var("EVENT_SOURCE_URL").unwrap_or_else(|| frontend_url.clone()),
            event_source_title: var("EVENT_SOURCE_TITLE")
                .unwrap_or_else(|| "Playlist Tracker".to_string()),
            frontend_url,

            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            youtube_api_key: required("YOUTUBE_API_KEY")?,
            jwt_access_key: required("JWT_ACCESS_SECRET")?.into_bytes(),
            jwt_refresh_key: required("JWT_REFRESH_SECRET")?.into_bytes(),
            cookie_secret: required("COOKIE_SECRET")?.into_bytes(),
        })
    }

    /// Derive the 64-byte cookie signing key from the configured secret.
    pub fn cookie_key(&self) -> Key {
        let hk = Hkdf::<Sha256>::new(None, &self.cookie_secret);
        let mut okm = [0u8; 64];
        // 64 bytes is far below the HKDF-SHA256 output limit of 255 * 32.
        hk.expand(b"playlist-tracker session cookie", &mut okm)
            .expect("64 bytes is a valid HKDF-SHA256 output length");
        Key::from(&okm)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_from_env() {
        env::set_var("GOOGLE_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_CLIENT_SECRET", " test_secret\n");
        env::set_var("GOOGLE_REDIRECT_URI", "http://localhost:5173/login");
        env::set_var("YOUTUBE_API_KEY", "yt_key");
        env::set_var("JWT_ACCESS_SECRET", "access_secret");
        env::set_var("JWT_REFRESH_SECRET", "refresh_secret");
        env::set_var("COOKIE_SECRET", "cookie_secret");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google_client_id, "test_id");
        assert_eq!(config.google_client_secret, "test_secret");
        assert_eq!(config.jwt_refresh_key, b"refresh_secret".to_vec());
        assert_eq!(config.port, 8080);
    }

    fn base_vars() -> HashMap<&'static str, String> {
        [
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("GOOGLE_REDIRECT_URI", "http://localhost:5173/login"),
            ("YOUTUBE_API_KEY", "yt_key"),
            ("JWT_ACCESS_SECRET", "access_secret"),
            ("JWT_REFRESH_SECRET", "refresh_secret"),
            ("COOKIE_SECRET", "cookie_secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_blank_secrets_are_rejected() {
        for name in ["JWT_ACCESS_SECRET", "JWT_REFRESH_SECRET", "COOKIE_SECRET"] {
            for blank in ["", "  \n"] {
                let mut vars = base_vars();
                vars.insert(name, blank.to_string());
                assert!(
                    matches!(load(&vars), Err(ConfigError::Invalid(n)) if n == name),
                    "{name} = {blank:?}"
                );
            }
        }

        let mut vars = base_vars();
        vars.remove("COOKIE_SECRET");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("COOKIE_SECRET"))));
    }

    #[test]
    fn test_numeric_settings() {
        let config = load(&base_vars()).expect("defaults should load");
        assert_eq!(config.port, 8080);
        assert_eq!(config.http_timeout, Duration::from_secs(10));

        let mut vars = base_vars();
        vars.insert("PORT", "9090".to_string());
        vars.insert("HTTP_TIMEOUT_SECS", "3".to_string());
        let config = load(&vars).expect("explicit values should load");
        assert_eq!(config.port, 9090);
        assert_eq!(config.http_timeout, Duration::from_secs(3));

        for (name, value) in [
            ("PORT", "eighty"),
            ("PORT", "70000"),
            ("HTTP_TIMEOUT_SECS", "soon"),
            ("HTTP_TIMEOUT_SECS", "0"),
        ] {
            let mut vars = base_vars();
            vars.insert(name, value.to_string());
            assert!(
                matches!(load(&vars), Err(ConfigError::Invalid(n)) if n == name),
                "{name} = {value}"
            );
        }
    }

    #[test]
    fn test_cookie_key_is_stable_for_same_secret() {
        let config = Config::test_default();
        assert_eq!(
            config.cookie_key().master(),
            config.cookie_key().master(),
            "key derivation must be deterministic"
        );

        let mut other = Config::test_default();
        other.cookie_secret = b"another secret".to_vec();
        assert_ne!(config.cookie_key().master(), other.cookie_key().master());
    }
}
