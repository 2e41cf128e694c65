//! The `VenueStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `grounds-store-sqlite`, or the in-memory store in [`crate::memory`]).
//! Higher layers (`grounds-api`, the check-in service) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
  checkin::CheckIn,
  location::{Location, LocationView},
  review::{NewReview, Review, ReviewView, VoteTally},
};

// ─── Append outcome ──────────────────────────────────────────────────────────

/// Result of the compare-and-append in [`VenueStore::record_check_in`].
#[derive(Debug, Clone)]
pub enum AppendOutcome {
  /// The record was durably written; the stored record is returned.
  Recorded(CheckIn),
  /// A record for the same `(subject_id, location_id)` already exists
  /// within the guard window. Nothing was written.
  Conflict(CheckIn),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Grounds storage backend.
///
/// Check-ins are append-only. Expired records may be physically pruned as
/// housekeeping, but no read depends on pruning having happened — the
/// query methods filter by age themselves.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait VenueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Check-ins ─────────────────────────────────────────────────────────

  /// Append `check_in` unless a record for the same subject and location
  /// already exists within `guard_window` of its timestamp.
  ///
  /// The check and the insert are a single atomic step: two concurrent
  /// calls for the same pair cannot both record.
  fn record_check_in(
    &self,
    check_in: CheckIn,
    guard_window: Duration,
  ) -> impl Future<Output = Result<AppendOutcome, Self::Error>> + Send + '_;

  /// Number of records for `location_id` still inside the validity
  /// window at `now`. Returns 0 for unknown locations.
  fn count_active<'a>(
    &'a self,
    location_id: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// The records behind [`VenueStore::count_active`], newest first.
  fn active_check_ins<'a>(
    &'a self,
    location_id: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<CheckIn>, Self::Error>> + Send + 'a;

  /// Most recent record for `(subject_id, location_id)` within `window`
  /// of `now`, or `None`.
  fn latest_check_in<'a>(
    &'a self,
    subject_id: &'a str,
    location_id: &'a str,
    now: DateTime<Utc>,
    window: Duration,
  ) -> impl Future<Output = Result<Option<CheckIn>, Self::Error>> + Send + 'a;

  /// Physically delete records with `recorded_at <= cutoff`. Returns the
  /// number removed. Housekeeping only.
  fn prune_before(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Locations ─────────────────────────────────────────────────────────

  /// Insert a location if its id is not already taken. Returns `true` when
  /// the row was inserted, `false` when it already existed. Used for
  /// seeding at startup.
  fn add_location(
    &self,
    location: Location,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Retrieve a location with its review aggregates. `None` if unknown.
  fn get_location<'a>(
    &'a self,
    location_id: &'a str,
  ) -> impl Future<Output = Result<Option<LocationView>, Self::Error>> + Send + 'a;

  /// All locations with their review aggregates.
  fn list_locations(
    &self,
  ) -> impl Future<Output = Result<Vec<LocationView>, Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  /// Persist a new review and return it. `review_id` and `created_at` are
  /// set by the store.
  fn add_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Reviews for a location, newest first, with vote tallies. When
  /// `caller` is supplied, each tally resolves that subject's own vote.
  fn reviews_for_location<'a>(
    &'a self,
    location_id: &'a str,
    caller: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<ReviewView>, Self::Error>> + Send + 'a;

  /// Record (or replace) `subject_id`'s vote on a review and return the
  /// updated tally. Returns `None` if the review does not exist.
  fn vote_review<'a>(
    &'a self,
    review_id: Uuid,
    subject_id: &'a str,
    agree: bool,
  ) -> impl Future<Output = Result<Option<VoteTally>, Self::Error>> + Send + 'a;
}
