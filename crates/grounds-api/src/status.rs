//! Handler for `GET /status` — the crowd-level read endpoint.

use axum::{
  Json,
  extract::{Query, State},
};
use grounds_core::{crowd::CrowdStatus, store::VenueStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub location_id: Option<String>,
}

/// `GET /status?location_id=<id>` — no auth; unknown locations read as
/// empty.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<StatusParams>,
) -> Result<Json<CrowdStatus>, ApiError>
where
  S: VenueStore + 'static,
{
  let status = state
    .service
    .status(params.location_id.as_deref().unwrap_or(""))
    .await?;
  Ok(Json(status))
}
