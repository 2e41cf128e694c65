//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Booleans are stored as 0/1 integers.

use chrono::{DateTime, Utc};
use grounds_core::{
  checkin::CheckIn,
  location::Location,
  review::Review,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `check_ins` row.
pub struct RawCheckIn {
  pub checkin_id:  String,
  pub subject_id:  String,
  pub location_id: String,
  pub recorded_at: String,
}

impl RawCheckIn {
  pub fn into_check_in(self) -> Result<CheckIn> {
    Ok(CheckIn {
      checkin_id:  decode_uuid(&self.checkin_id)?,
      subject_id:  self.subject_id,
      location_id: self.location_id,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read from a `locations` row, with review aggregates joined in.
pub struct RawLocation {
  pub location_id:  String,
  pub name:         String,
  pub address:      String,
  pub created_at:   String,
  pub rating:       Option<f64>,
  pub review_count: i64,
}

impl RawLocation {
  pub fn into_location(self) -> Result<(Location, Option<f64>, usize)> {
    let location = Location {
      location_id: self.location_id,
      name:        self.name,
      address:     self.address,
      created_at:  decode_dt(&self.created_at)?,
    };
    Ok((location, self.rating, self.review_count as usize))
  }
}

/// Raw strings read from a `reviews` row.
pub struct RawReview {
  pub review_id:   String,
  pub location_id: String,
  pub subject_id:  String,
  pub author_name: String,
  pub body:        String,
  pub rating:      i64,
  pub created_at:  String,
}

impl RawReview {
  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      review_id:   decode_uuid(&self.review_id)?,
      location_id: self.location_id,
      subject_id:  self.subject_id,
      author_name: self.author_name,
      body:        self.body,
      rating:      self.rating as u8,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
