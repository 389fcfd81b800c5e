use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::contact::ContactError;
use crate::tmdb::UpstreamError;

pub const GENERIC_FAILURE: &str = "Something went wrong!";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Query parameter is required")]
    MissingQuery,

    #[error("Page must be a positive integer")]
    InvalidPage,

    #[error("timeWindow must be 'day' or 'week'")]
    InvalidTimeWindow,

    #[error("Movie id must be a positive integer")]
    InvalidMovieId,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("Request body is too large")]
    PayloadTooLarge,

    #[error("Too many requests from this IP, please try again later.")]
    RateLimited { retry_after: u64 },

    #[error("Route not found")]
    NotFound,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("{0}")]
    Internal(String),
}

/// Detail of a server-side failure, attached to the 500 response so the
/// error layer can decide whether to expose it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingQuery
            | ApiError::InvalidPage
            | ApiError::InvalidTimeWindow
            | ApiError::InvalidMovieId
            | ApiError::BadRequest(_)
            | ApiError::Contact(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Upstream(_) | ApiError::Internal(_) => {
                let mut response =
                    (status, Json(json!({ "error": GENERIC_FAILURE }))).into_response();
                response
                    .extensions_mut()
                    .insert(ErrorDetail(self.to_string()));
                response
            }
            ApiError::Contact(ref err) => (
                status,
                Json(json!({ "error": err.to_string(), "field": err.field() })),
            )
                .into_response(),
            ApiError::RateLimited { retry_after } => {
                let mut response =
                    (status, Json(json!({ "error": self.to_string() }))).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
            _ => (status, Json(json!({ "error": self.to_string() }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status() {
        assert_eq!(ApiError::MissingQuery.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::RateLimited { retry_after: 3 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Upstream(UpstreamError::new("Error searching movies", "boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_carry_detail_extension() {
        let response =
            ApiError::Upstream(UpstreamError::new("Error fetching movie details", "timeout"))
                .into_response();
        let detail = response.extensions().get::<ErrorDetail>().cloned();
        assert_eq!(
            detail.map(|d| d.0).as_deref(),
            Some("Error fetching movie details: timeout")
        );
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 42 }.into_response();
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("42")
        );
    }
}
