//! Check-in records — the fundamental unit of the crowd tracker.
//!
//! A check-in is an immutable, timestamped assertion that a subject is
//! present at a location. Records are never updated; they age out of the
//! occupancy count after the validity window and out of rate-limit
//! consideration after the (longer) rate-limit window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Windows ─────────────────────────────────────────────────────────────────

/// How long a check-in counts toward a location's live occupancy.
pub const VALIDITY_MINUTES: i64 = 90;

/// How long a check-in blocks the same subject from checking in again at
/// the same location. Longer than [`VALIDITY_MINUTES`]: a record can stop
/// counting toward occupancy while still blocking a new check-in.
pub const RATE_LIMIT_MINUTES: i64 = 120;

pub fn validity_window() -> Duration { Duration::minutes(VALIDITY_MINUTES) }

pub fn rate_limit_window() -> Duration { Duration::minutes(RATE_LIMIT_MINUTES) }

// ─── CheckIn ─────────────────────────────────────────────────────────────────

/// A timestamped presence assertion. Once written, no field ever changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
  pub checkin_id:  Uuid,
  /// Stable identifier of the checking-in subject — derived from the
  /// authenticated identity, never raw proof material.
  pub subject_id:  String,
  pub location_id: String,
  /// Assigned at creation; records are appended in real time, never
  /// backdated.
  pub recorded_at: DateTime<Utc>,
}

impl CheckIn {
  /// Build a new record with a fresh UUID.
  pub fn new(
    subject_id: impl Into<String>,
    location_id: impl Into<String>,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self {
      checkin_id:  Uuid::new_v4(),
      subject_id:  subject_id.into(),
      location_id: location_id.into(),
      recorded_at,
    }
  }

  /// Whether this record still counts toward live occupancy at `now`.
  pub fn is_active(&self, now: DateTime<Utc>) -> bool {
    now - self.recorded_at < validity_window()
  }
}
