//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("rate limited: {message}")]
  RateLimited { message: String, minutes: i64 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<grounds_core::Error> for ApiError {
  fn from(e: grounds_core::Error) -> Self {
    use grounds_core::Error;
    match e {
      Error::MissingLocationId
      | Error::EmptyReviewBody
      | Error::RatingOutOfRange(_) => ApiError::BadRequest(e.to_string()),
      Error::Unauthenticated => ApiError::Unauthorized(e.to_string()),
      Error::VerificationRequired => ApiError::Forbidden(e.to_string()),
      Error::RateLimited { minutes } => {
        ApiError::RateLimited { message: e.to_string(), minutes }
      }
      Error::Storage(inner) => ApiError::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::RateLimited { message, .. } => {
        (StatusCode::TOO_MANY_REQUESTS, message.clone())
      }
      // Storage details stay in the logs; callers get a generic message.
      ApiError::Store(e) => {
        tracing::error!("store error: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable".to_string())
      }
    };

    let mut response =
      (status, Json(json!({ "error": message }))).into_response();

    if let ApiError::RateLimited { minutes, .. } = &self
      && let Ok(value) = HeaderValue::from_str(&(minutes * 60).to_string())
    {
      response.headers_mut().insert(header::RETRY_AFTER, value);
    }

    response
  }
}
