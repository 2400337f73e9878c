use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_submit_per_min: u32,

    // Draft sessions
    pub draft_ttl: Duration,
    pub draft_capacity: u64,

    /// Check-ins after this time count as late in attendance summaries
    pub late_after: NaiveTime,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),

            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,
            rate_submit_per_min: parse_or(&lookup, "RATE_SUBMIT_PER_MIN", 30)?,

            draft_ttl: Duration::from_secs(parse_or(&lookup, "DRAFT_TTL_SECS", 1800)?), // 30 min
            draft_capacity: parse_or(&lookup, "DRAFT_CAPACITY", 10_000)?,

            late_after: match lookup("LATE_AFTER") {
                Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M")
                    .with_context(|| format!("LATE_AFTER must be HH:MM, got {raw:?}"))?,
                None => NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value {raw:?}")),
        None => Ok(default),
    }
}
