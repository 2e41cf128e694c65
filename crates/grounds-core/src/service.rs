//! The check-in service — the authenticated, rule-enforcing façade over a
//! [`VenueStore`], exposed to the HTTP layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  checkin::{self, CheckIn},
  crowd::{CrowdLevel, CrowdStatus},
  identity::Identity,
  store::{AppendOutcome, VenueStore},
};

/// What a successful check-in returns: the stored record plus the updated
/// occupancy for the location.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInReceipt {
  pub check_in:      CheckIn,
  pub current_count: usize,
  pub level:         CrowdLevel,
}

/// Orchestrates reads and writes against the store, enforcing
/// authentication and rate-limit rules. Cloning is cheap.
pub struct CheckInService<S> {
  store: Arc<S>,
}

impl<S> Clone for CheckInService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: VenueStore> CheckInService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Current occupancy and crowd level for a location. No authentication;
  /// unknown locations read as empty.
  pub async fn status(&self, location_id: &str) -> Result<CrowdStatus> {
    if location_id.trim().is_empty() {
      return Err(Error::MissingLocationId);
    }
    let now = Utc::now();
    let current_count = self
      .store
      .count_active(location_id, now)
      .await
      .map_err(box_store)?;
    Ok(CrowdStatus {
      current_count,
      level: CrowdLevel::from_count(current_count),
      last_updated: now,
    })
  }

  /// The active records behind [`CheckInService::status`], newest first.
  pub async fn active(&self, location_id: &str) -> Result<Vec<CheckIn>> {
    if location_id.trim().is_empty() {
      return Err(Error::MissingLocationId);
    }
    self
      .store
      .active_check_ins(location_id, Utc::now())
      .await
      .map_err(box_store)
  }

  /// Record a presence assertion for `caller` at `location_id`.
  ///
  /// Preconditions are checked in a fixed order: authentication,
  /// verification, input, rate limit. The append is the final step;
  /// nothing is persisted when any check fails.
  pub async fn check_in(
    &self,
    location_id: &str,
    caller: Option<&Identity>,
  ) -> Result<CheckInReceipt> {
    let caller = caller.ok_or(Error::Unauthenticated)?;
    if !caller.verified {
      return Err(Error::VerificationRequired);
    }
    if location_id.trim().is_empty() {
      return Err(Error::MissingLocationId);
    }

    let now = Utc::now();
    let window = checkin::rate_limit_window();

    if let Some(prior) = self
      .store
      .latest_check_in(&caller.subject_id, location_id, now, window)
      .await
      .map_err(box_store)?
    {
      return Err(rate_limited(now, prior.recorded_at));
    }

    // The store re-checks atomically; a concurrent racer loses here even
    // if the pre-check above saw no prior record.
    let record = CheckIn::new(caller.subject_id.clone(), location_id, now);
    let check_in = match self
      .store
      .record_check_in(record, window)
      .await
      .map_err(box_store)?
    {
      AppendOutcome::Recorded(stored) => stored,
      AppendOutcome::Conflict(existing) => {
        return Err(rate_limited(now, existing.recorded_at));
      }
    };

    // Housekeeping: drop records past the validity window.
    self
      .store
      .prune_before(now - checkin::validity_window())
      .await
      .map_err(box_store)?;

    let current_count = self
      .store
      .count_active(location_id, now)
      .await
      .map_err(box_store)?;

    Ok(CheckInReceipt {
      check_in,
      current_count,
      level: CrowdLevel::from_count(current_count),
    })
  }
}

fn box_store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Storage(Box::new(e))
}

/// Remaining wait, rounded up to whole minutes. The prior record is always
/// inside the window here, so the result is at least 1.
fn rate_limited(now: DateTime<Utc>, prior_at: DateTime<Utc>) -> Error {
  let remaining = checkin::rate_limit_window() - (now - prior_at);
  let secs = remaining.num_seconds();
  Error::RateLimited { minutes: secs / 60 + if secs % 60 > 0 { 1 } else { 0 } }
}
