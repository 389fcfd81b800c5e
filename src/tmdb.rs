use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DETAIL_APPENDS: &str = "credits,videos,similar";

/// Failure talking to the provider, prefixed with the operation that failed.
#[derive(Debug, Error)]
#[error("{context}: {message}")]
pub struct UpstreamError {
    pub context: String,
    pub message: String,
}

impl UpstreamError {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }

    fn wrap(context: &str, err: anyhow::Error) -> Self {
        Self::new(context, format!("{err:#}"))
    }
}

/// The fixed listing types the provider exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Popular,
    Trending,
    TopRated,
    NowPlaying,
    Upcoming,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Popular,
        Category::Trending,
        Category::TopRated,
        Category::NowPlaying,
        Category::Upcoming,
    ];

    /// Public slug used in `/api/movies/{slug}`.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::Trending => "trending",
            Category::TopRated => "top-rated",
            Category::NowPlaying => "now-playing",
            Category::Upcoming => "upcoming",
        }
    }

    /// Provider path; `window` only matters for trending.
    pub fn provider_path(self, window: TimeWindow) -> String {
        match self {
            Category::Popular => "/movie/popular".to_string(),
            Category::Trending => format!("/trending/movie/{}", window.as_str()),
            Category::TopRated => "/movie/top_rated".to_string(),
            Category::NowPlaying => "/movie/now_playing".to_string(),
            Category::Upcoming => "/movie/upcoming".to_string(),
        }
    }

    fn error_context(self) -> &'static str {
        match self {
            Category::Popular => "Error fetching popular movies",
            Category::Trending => "Error fetching trending movies",
            Category::TopRated => "Error fetching top rated movies",
            Category::NowPlaying => "Error fetching now playing movies",
            Category::Upcoming => "Error fetching upcoming movies",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| anyhow!("unknown category '{}'", s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Aggregation period for trending listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            _ => Err(anyhow!("time window must be 'day' or 'week'")),
        }
    }
}

#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn search_movies(&self, query: &str, page: u32) -> Result<Value, UpstreamError>;
    async fn list_movies(
        &self,
        category: Category,
        window: TimeWindow,
        page: u32,
    ) -> Result<Value, UpstreamError>;
    async fn movie_details(&self, id: u64) -> Result<Value, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tmdb_api_key.clone(), config.tmdb_base_url.clone())
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        debug!("TMDB GET {} {:?}", path, params);
        let res = self
            .client
            .get(self.url(path, params))
            .send()
            .await
            .map_err(|e| anyhow!("request failed: {}", e.without_url()))?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            warn!("TMDB {} answered {}", path, status);
            return Err(match provider_message(&text) {
                Some(msg) => anyhow!("provider returned {}: {}", status, msg),
                None => anyhow!("provider returned {}", status),
            });
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl MovieProvider for TmdbClient {
    async fn search_movies(&self, query: &str, page: u32) -> Result<Value, UpstreamError> {
        let page = page.to_string();
        self.get_json("/search/movie", &[("query", query), ("page", page.as_str())])
            .await
            .map_err(|e| UpstreamError::wrap("Error searching movies", e))
    }

    async fn list_movies(
        &self,
        category: Category,
        window: TimeWindow,
        page: u32,
    ) -> Result<Value, UpstreamError> {
        let page = page.to_string();
        self.get_json(&category.provider_path(window), &[("page", page.as_str())])
            .await
            .map_err(|e| UpstreamError::wrap(category.error_context(), e))
    }

    async fn movie_details(&self, id: u64) -> Result<Value, UpstreamError> {
        self.get_json(
            &format!("/movie/{id}"),
            &[("append_to_response", DETAIL_APPENDS)],
        )
        .await
        .map_err(|e| UpstreamError::wrap("Error fetching movie details", e))
    }
}

/// TMDB error bodies look like `{"status_code":7,"status_message":"..."}`.
fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("status_message")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_paths_match_provider() {
        assert_eq!(
            Category::Popular.provider_path(TimeWindow::Day),
            "/movie/popular"
        );
        assert_eq!(
            Category::Trending.provider_path(TimeWindow::Week),
            "/trending/movie/week"
        );
        assert_eq!(
            Category::TopRated.provider_path(TimeWindow::Week),
            "/movie/top_rated"
        );
        assert_eq!(
            Category::NowPlaying.provider_path(TimeWindow::Day),
            "/movie/now_playing"
        );
        assert_eq!(
            Category::Upcoming.provider_path(TimeWindow::Day),
            "/movie/upcoming"
        );
    }

    #[test]
    fn parses_category_slugs() {
        assert_eq!("top-rated".parse::<Category>().unwrap(), Category::TopRated);
        assert_eq!("now_playing".parse::<Category>().unwrap(), Category::NowPlaying);
        assert_eq!(" Trending ".parse::<Category>().unwrap(), Category::Trending);
        assert!("latest".parse::<Category>().is_err());
    }

    #[test]
    fn parses_time_window() {
        assert_eq!("WEEK".parse::<TimeWindow>().unwrap(), TimeWindow::Week);
        assert_eq!(TimeWindow::default(), TimeWindow::Day);
        assert!("month".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn url_encodes_params_and_attaches_key() {
        let client = TmdbClient::new("k&y", "http://localhost:1/3/");
        let url = client.url("/search/movie", &[("query", "star wars"), ("page", "2")]);
        assert_eq!(
            url,
            "http://localhost:1/3/search/movie?api_key=k%26y&query=star%20wars&page=2"
        );
    }

    #[test]
    fn extracts_provider_status_message() {
        let body = r#"{"status_code":7,"status_message":"Invalid API key","success":false}"#;
        assert_eq!(provider_message(body).as_deref(), Some("Invalid API key"));
        assert_eq!(provider_message("<html>"), None);
    }

    #[test]
    fn upstream_error_carries_prefix() {
        let err = UpstreamError::new("Error fetching popular movies", "provider returned 500");
        assert_eq!(
            err.to_string(),
            "Error fetching popular movies: provider returned 500"
        );
    }
}
