//! Handlers for `/checkins` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/checkins` | `?location_id` required; active records only; no auth |
//! | `POST` | `/checkins` | Body: `{"location_id":"..."}`; verified session required |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use grounds_core::{checkin::CheckIn, store::VenueStore};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, session::Caller};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub location_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub current_count: usize,
  pub check_ins:     Vec<CheckIn>,
}

/// `GET /checkins?location_id=<id>`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: VenueStore + 'static,
{
  let check_ins = state
    .service
    .active(params.location_id.as_deref().unwrap_or(""))
    .await?;
  Ok(Json(ListResponse { current_count: check_ins.len(), check_ins }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub location_id: String,
}

/// `POST /checkins` — body: `{"location_id":"..."}`.
///
/// Returns 201 with the stored record and the location's updated
/// occupancy. 401/403/400/429 per the service's precondition order.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VenueStore + 'static,
{
  let receipt = state
    .service
    .check_in(&body.location_id, caller.0.as_ref())
    .await?;

  tracing::info!(
    location = %receipt.check_in.location_id,
    count = receipt.current_count,
    "check-in recorded"
  );

  Ok((StatusCode::CREATED, Json(receipt)))
}
