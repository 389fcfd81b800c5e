use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::app::AppState;
use crate::contact::{ContactForm, SUBMITTED};
use crate::error::ApiError;
use crate::tmdb::{Category, TimeWindow};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    #[serde(rename = "timeWindow")]
    time_window: Option<String>,
}

/// Movie and contact endpoints. Every category shares one handler. A known
/// path hit with the wrong method is answered like an unknown path.
pub fn api_routes() -> Router<AppState> {
    let mut router = Router::new().route(
        "/api/movies/search",
        get(search_movies).fallback(not_found),
    );
    for category in Category::ALL {
        router = router.route(
            &format!("/api/movies/{}", category.slug()),
            get(
                move |state: State<AppState>, params: Result<Query<ListParams>, QueryRejection>| {
                    list_movies(state, category, params)
                },
            )
            .fallback(not_found),
        );
    }
    router
        .route("/api/movies/:id", get(movie_details).fallback(not_found))
        .route("/api/contact", post(submit_contact).fallback(not_found))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn search_movies(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingQuery)?;
    let page = parse_page(params.page.as_deref())?;
    debug!("Searching movies for '{}' (page {})", query, page);
    let data = state.provider.search_movies(query, page).await?;
    Ok(Json(data))
}

async fn list_movies(
    State(state): State<AppState>,
    category: Category,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = parse_page(params.page.as_deref())?;
    let window = parse_time_window(params.time_window.as_deref())?;
    debug!("Listing {} movies (page {})", category, page);
    let data = state.provider.list_movies(category, window, page).await?;
    Ok(Json(data))
}

async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_movie_id(&id)?;
    debug!("Fetching movie {}", id);
    let data = state.provider.movie_details(id).await?;
    Ok(Json(data))
}

async fn submit_contact(
    form: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(mut form) = form.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        _ => ApiError::BadRequest(e.body_text()),
    })?;
    form.submit()?;
    info!("Contact form accepted");
    Ok(Json(json!({ "status": "success", "message": SUBMITTED })))
}

/// Absent means page 1; anything supplied must be a positive integer.
pub fn parse_page(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw {
        None => Ok(1),
        Some(value) => match value.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(ApiError::InvalidPage),
        },
    }
}

pub fn parse_time_window(raw: Option<&str>) -> Result<TimeWindow, ApiError> {
    match raw {
        None => Ok(TimeWindow::default()),
        Some(value) => value.parse().map_err(|_| ApiError::InvalidTimeWindow),
    }
}

fn parse_movie_id(raw: &str) -> Result<u64, ApiError> {
    match raw.parse::<u64>() {
        Ok(id) if id >= 1 && raw.chars().all(|c| c.is_ascii_digit()) => Ok(id),
        _ => Err(ApiError::InvalidMovieId),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_one() {
        assert_eq!(parse_page(None).unwrap(), 1);
    }

    #[test]
    fn page_must_be_positive_integer() {
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        assert_eq!(parse_page(Some(" 12 ")).unwrap(), 12);
        for bad in ["0", "-1", "abc", "1.5", "", "1e3", "99999999999"] {
            assert!(
                matches!(parse_page(Some(bad)), Err(ApiError::InvalidPage)),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn time_window_defaults_to_day() {
        assert_eq!(parse_time_window(None).unwrap(), TimeWindow::Day);
        assert_eq!(parse_time_window(Some("week")).unwrap(), TimeWindow::Week);
        assert!(matches!(
            parse_time_window(Some("year")),
            Err(ApiError::InvalidTimeWindow)
        ));
    }

    #[test]
    fn movie_id_is_numeric() {
        assert_eq!(parse_movie_id("550").unwrap(), 550);
        for bad in ["0", "+550", "abc", "55a", ""] {
            assert!(
                matches!(parse_movie_id(bad), Err(ApiError::InvalidMovieId)),
                "{bad:?}"
            );
        }
    }
}
