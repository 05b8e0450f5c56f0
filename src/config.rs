// Runtime configuration, resolved once at startup from the environment
// (after `.env` has been loaded).

use crate::core::ai::{AiConfig, RetryPolicy};
use crate::infra::accounts::PoolSettings;
use anyhow::{bail, Result};
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/medassist.db";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    /// Overrides the Gemini API root (a proxy or a local stub).
    pub gemini_base_url: Option<String>,
    pub ai: AiConfig,
    /// Attempts per interactive turn before the fallback reply is used.
    pub ai_retry: RetryPolicy,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub database_url: String,
    pub pool: PoolSettings,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(gemini_api_key) = non_empty("GOOGLE_GEMINI_API") else {
            bail!(
                "Missing GOOGLE_GEMINI_API environment variable! Add your Gemini API key to .env"
            );
        };

        let defaults = AiConfig::default();
        let ai = AiConfig {
            model: non_empty("GEMINI_MODEL").unwrap_or(defaults.model.clone()),
            temperature: parse_or(
                "GEMINI_TEMPERATURE",
                lookup("GEMINI_TEMPERATURE"),
                defaults.temperature,
            ),
            ..defaults
        };

        let retry_defaults = RetryPolicy::default();
        let ai_retry = RetryPolicy {
            max_attempts: parse_or(
                "GEMINI_MAX_ATTEMPTS",
                lookup("GEMINI_MAX_ATTEMPTS"),
                retry_defaults.max_attempts,
            )
            .max(1),
            ..retry_defaults
        };

        let pool_defaults = PoolSettings::default();
        let pool = PoolSettings {
            max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                lookup("DB_MAX_CONNECTIONS"),
                pool_defaults.max_connections,
            ),
            min_connections: parse_or(
                "DB_MIN_CONNECTIONS",
                lookup("DB_MIN_CONNECTIONS"),
                pool_defaults.min_connections,
            ),
            ..pool_defaults
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: non_empty("GEMINI_BASE_URL"),
            ai,
            ai_retry,
            search_api_key: non_empty("GOOGLE_SEARCH_API_KEY"),
            search_engine_id: non_empty("GOOGLE_CSE_ID"),
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            pool,
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses a numeric setting; unset keeps the default, garbage warns and keeps it.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{}' for {}, using {}", value, key, default);
            default
        }),
    }
}
