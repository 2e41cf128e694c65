//! JSON REST API for Grounds.
//!
//! Exposes an axum [`Router`] backed by any
//! [`grounds_core::store::VenueStore`]. TLS and transport concerns are the
//! caller's responsibility; authentication arrives as signed bearer tokens
//! (see [`session`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", grounds_api::api_router(state))
//! ```

pub mod checkins;
pub mod error;
pub mod locations;
pub mod reviews;
pub mod session;
pub mod status;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use grounds_core::{service::CheckInService, store::VenueStore};

pub use error::ApiError;
pub use session::SessionKey;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub service:  CheckInService<S>,
  pub sessions: Arc<SessionKey>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      service:  self.service.clone(),
      sessions: Arc::clone(&self.sessions),
    }
  }
}

impl<S: VenueStore> AppState<S> {
  pub fn new(store: Arc<S>, sessions: SessionKey) -> Self {
    Self {
      service:  CheckInService::new(Arc::clone(&store)),
      store,
      sessions: Arc::new(sessions),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: VenueStore + 'static,
{
  Router::new()
    // Crowd status
    .route("/status", get(status::handler::<S>))
    // Check-ins
    .route(
      "/checkins",
      get(checkins::list::<S>).post(checkins::create::<S>),
    )
    // Locations
    .route("/locations", get(locations::list::<S>))
    .route("/locations/{id}", get(locations::get_one::<S>))
    // Reviews
    .route("/reviews", get(reviews::list::<S>).post(reviews::create::<S>))
    .route("/reviews/{id}/vote", post(reviews::vote::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
