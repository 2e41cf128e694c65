//! Handlers for `/locations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/locations` | All locations with review aggregates |
//! | `GET`  | `/locations/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use grounds_core::{location::LocationView, store::VenueStore};

use crate::{AppState, error::ApiError};

/// `GET /locations`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<LocationView>>, ApiError>
where
  S: VenueStore + 'static,
{
  let locations = state
    .store
    .list_locations()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(locations))
}

/// `GET /locations/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<LocationView>, ApiError>
where
  S: VenueStore + 'static,
{
  let view = state
    .store
    .get_location(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("location {id} not found")))?;
  Ok(Json(view))
}
