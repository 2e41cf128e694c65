//! Handlers for `/reviews` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reviews` | `?location_id` required; no auth; caller vote resolved from token |
//! | `POST` | `/reviews` | Body: [`CreateBody`]; verified session required |
//! | `POST` | `/reviews/:id/vote` | Body: `{"agree":true}`; signed-in session required |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use grounds_core::{
  Error,
  review::{NewReview, Review, ReviewView, VoteTally},
  store::VenueStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::Caller};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub location_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub reviews: Vec<ReviewView>,
}

/// `GET /reviews?location_id=<id>`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: VenueStore + 'static,
{
  let location_id = params.location_id.unwrap_or_default();
  if location_id.trim().is_empty() {
    return Err(Error::MissingLocationId.into());
  }

  let caller_id = caller.0.as_ref().map(|i| i.subject_id.as_str());
  let reviews = state
    .store
    .reviews_for_location(&location_id, caller_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(ListResponse { reviews }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub location_id: String,
  #[serde(default)]
  pub body:        String,
  #[serde(default)]
  pub rating:      u8,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
  pub review: Review,
}

/// `POST /reviews` — publishing requires a verified identity.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VenueStore + 'static,
{
  let caller = caller.0.as_ref().ok_or(Error::Unauthenticated)?;
  if !caller.verified {
    return Err(Error::VerificationRequired.into());
  }

  let input = NewReview {
    location_id: body.location_id,
    subject_id:  caller.subject_id.clone(),
    author_name: caller.author_name().to_owned(),
    body:        body.body,
    rating:      body.rating,
  };
  input.validate()?;

  let review = state
    .store
    .add_review(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(CreateResponse { review })))
}

// ─── Vote ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub agree: bool,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
  pub votes: VoteTally,
}

/// `POST /reviews/:id/vote` — voting requires sign-in, not verification.
pub async fn vote<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<VoteBody>,
) -> Result<Json<VoteResponse>, ApiError>
where
  S: VenueStore + 'static,
{
  let caller = caller.0.as_ref().ok_or(Error::Unauthenticated)?;

  let votes = state
    .store
    .vote_review(id, &caller.subject_id, body.agree)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("review {id} not found")))?;
  Ok(Json(VoteResponse { votes }))
}
