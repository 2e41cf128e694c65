//! Error types for `grounds-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("location id is required")]
  MissingLocationId,

  #[error("you must be signed in")]
  Unauthenticated,

  #[error("identity verification required")]
  VerificationRequired,

  #[error(
    "already checked in here recently; wait {minutes} minutes before checking in again"
  )]
  RateLimited { minutes: i64 },

  #[error("review body is required")]
  EmptyReviewBody,

  #[error("rating must be between 1 and 5, got {0}")]
  RatingOutOfRange(u8),

  #[error("storage unavailable: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
