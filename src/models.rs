//! Typed views over provider documents, used only when rendering.
//!
//! The proxy never deserializes into these; every field is optional and
//! unknown fields are ignored.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/original";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/500x750?text=No+Image";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieSummary {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePage {
    pub page: Option<u32>,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub homepage: Option<String>,
    pub tagline: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_count: Option<u64>,
}

/// Grid entry for a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: Option<u64>,
    pub title: String,
    pub poster_url: String,
    pub year: String,
    pub rating: String,
}

impl From<&MovieSummary> for MovieCard {
    fn from(movie: &MovieSummary) -> Self {
        Self {
            id: movie.id,
            title: title_or_untitled(movie.title.as_deref()),
            poster_url: poster_url(movie.poster_path.as_deref()),
            year: parse_date(movie.release_date.as_deref())
                .map(|d| d.year().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            rating: format_rating(movie.vote_average),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetailView {
    pub title: String,
    pub tagline: Option<String>,
    pub poster_url: String,
    pub backdrop_url: Option<String>,
    pub rating: String,
    pub vote_count: u64,
    pub release: String,
    pub runtime: String,
    pub genres: Vec<String>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub homepage: Option<String>,
    pub overview: Option<String>,
}

impl From<&MovieDetail> for MovieDetailView {
    fn from(movie: &MovieDetail) -> Self {
        let summary = &movie.summary;
        Self {
            title: title_or_untitled(summary.title.as_deref()),
            tagline: non_empty(movie.tagline.as_deref()),
            poster_url: poster_url(summary.poster_path.as_deref()),
            backdrop_url: non_empty(movie.backdrop_path.as_deref())
                .map(|p| format!("{BACKDROP_BASE}{p}")),
            rating: format_rating(summary.vote_average),
            vote_count: movie.vote_count.unwrap_or(0),
            release: parse_date(summary.release_date.as_deref())
                .map(|d| d.format("%B %-d, %Y").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            runtime: format_runtime(movie.runtime),
            genres: movie.genres.iter().map(|g| g.name.clone()).collect(),
            budget: movie.budget.filter(|b| *b > 0).map(format_dollars),
            revenue: movie.revenue.filter(|r| *r > 0).map(format_dollars),
            homepage: non_empty(movie.homepage.as_deref()),
            overview: non_empty(summary.overview.as_deref()),
        }
    }
}

pub fn poster_url(path: Option<&str>) -> String {
    match non_empty(path) {
        Some(p) => format!("{POSTER_BASE}{p}"),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// Zero counts as unrated.
pub fn format_rating(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v > 0.0 => format!("{v:.1}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{}h {}m", m / 60, m % 60),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_dollars(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn parse_date(date: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(non_empty(date)?.as_str(), "%Y-%m-%d").ok()
}

fn title_or_untitled(title: Option<&str>) -> String {
    non_empty(title).unwrap_or_else(|| "Untitled".to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
