use anyhow::{anyhow, bail, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::tmdb::TMDB_BASE;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub port: u16,
    /// Hides 500 detail messages when set.
    pub production: bool,
    pub static_dir: PathBuf,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Key rate limits on forwarding headers instead of the socket peer.
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tmdb_api_key = lookup("TMDB_API_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("Missing required environment variable: TMDB_API_KEY"))?;

        let rate_limit_max: u32 = parse_or(&lookup, "RATE_LIMIT_MAX", 100)?;
        if rate_limit_max == 0 {
            bail!("RATE_LIMIT_MAX must be at least 1");
        }
        let rate_limit_window_secs: u64 = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", 15 * 60)?;
        if rate_limit_window_secs == 0 {
            bail!("RATE_LIMIT_WINDOW_SECS must be at least 1");
        }

        let production = lookup("APP_ENV")
            .map(|v| v.trim().eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let trust_proxy = lookup("TRUST_PROXY")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url: lookup("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            production,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            rate_limit_max,
            rate_limit_window_secs,
            trust_proxy,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {} value '{}': {}", key, raw, e)),
        None => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}
