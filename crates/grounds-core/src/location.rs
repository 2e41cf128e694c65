//! Locations — the venues subjects check in to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered venue. The identifier is an opaque caller-visible string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
  pub location_id: String,
  pub name:        String,
  pub address:     String,
  pub created_at:  DateTime<Utc>,
}

/// A location with its review aggregates — the computed read model for
/// listings, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationView {
  pub location:     Location,
  /// Mean review rating; `None` while the location has no reviews.
  pub rating:       Option<f64>,
  pub review_count: usize,
}
