// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

const DEFAULT_DETAILS_STALE_AFTER_SECS: i64 = 30;
const DEFAULT_SUMMARIES_STALE_AFTER_SECS: i64 = 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project URL of the hosted backend (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public anon key, sent as the `apikey` header
    pub supabase_anon_key: String,
    /// Session JWT for row-level security; the anon key is used when absent
    pub access_token: Option<String>,
    /// Bike details older than this are refetched on focus
    pub details_stale_after_secs: i64,
    /// Bike summaries older than this are refetched on focus
    pub summaries_stale_after_secs: i64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            access_token: None,
            details_stale_after_secs: DEFAULT_DETAILS_STALE_AFTER_SECS,
            summaries_stale_after_secs: DEFAULT_SUMMARIES_STALE_AFTER_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local use.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let supabase_url = env::var("SUPABASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        if supabase_url.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL"));
        }

        Ok(Self {
            supabase_url,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            access_token: env::var("SUPABASE_ACCESS_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            details_stale_after_secs: parse_secs(
                "DETAILS_STALE_AFTER_SECS",
                DEFAULT_DETAILS_STALE_AFTER_SECS,
            )?,
            summaries_stale_after_secs: parse_secs(
                "SUMMARIES_STALE_AFTER_SECS",
                DEFAULT_SUMMARIES_STALE_AFTER_SECS,
            )?,
        })
    }

    /// Token sent in the `Authorization: Bearer` header.
    pub fn bearer_token(&self) -> &str {
        self.access_token
            .as_deref()
            .unwrap_or(&self.supabase_anon_key)
    }
}

fn parse_secs(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs >= 0)
            .ok_or(ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
