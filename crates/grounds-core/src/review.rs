//! Reviews and review votes.
//!
//! A review is immutable once published. Votes are the one mutable surface:
//! a subject may vote agree/disagree on a review, and voting again replaces
//! the earlier vote rather than stacking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

// ─── Review ──────────────────────────────────────────────────────────────────

/// A published review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub review_id:   Uuid,
  pub location_id: String,
  pub subject_id:  String,
  /// Display name captured at publication time.
  pub author_name: String,
  pub body:        String,
  pub rating:      u8,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::VenueStore::add_review`].
/// `review_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewReview {
  pub location_id: String,
  pub subject_id:  String,
  pub author_name: String,
  pub body:        String,
  pub rating:      u8,
}

impl NewReview {
  pub fn validate(&self) -> Result<()> {
    if self.location_id.trim().is_empty() {
      return Err(Error::MissingLocationId);
    }
    if self.body.trim().is_empty() {
      return Err(Error::EmptyReviewBody);
    }
    if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
      return Err(Error::RatingOutOfRange(self.rating));
    }
    Ok(())
  }
}

// ─── Votes ───────────────────────────────────────────────────────────────────

/// One subject's agree/disagree vote on a review. At most one per
/// `(review_id, subject_id)`; re-voting replaces the previous vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewVote {
  pub vote_id:     Uuid,
  pub review_id:   Uuid,
  pub subject_id:  String,
  pub agree:       bool,
  pub recorded_at: DateTime<Utc>,
}

/// Vote counts for a review, with the caller's own vote resolved when the
/// caller is known.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteTally {
  pub agree_count:    usize,
  pub disagree_count: usize,
  pub caller_vote:    Option<bool>,
}

/// A review bundled with its tally — the read model for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewView {
  pub review: Review,
  pub votes:  VoteTally,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(rating: u8) -> NewReview {
    NewReview {
      location_id: "1".into(),
      subject_id:  "s1".into(),
      author_name: "Bean Enthusiast".into(),
      body:        "Great espresso.".into(),
      rating,
    }
  }

  #[test]
  fn valid_review_passes() {
    assert!(input(5).validate().is_ok());
    assert!(input(1).validate().is_ok());
  }

  #[test]
  fn rating_bounds_enforced() {
    assert!(matches!(
      input(0).validate(),
      Err(Error::RatingOutOfRange(0))
    ));
    assert!(matches!(
      input(6).validate(),
      Err(Error::RatingOutOfRange(6))
    ));
  }

  #[test]
  fn blank_body_rejected() {
    let mut r = input(4);
    r.body = "   ".into();
    assert!(matches!(r.validate(), Err(Error::EmptyReviewBody)));
  }

  #[test]
  fn missing_location_rejected() {
    let mut r = input(4);
    r.location_id = String::new();
    assert!(matches!(r.validate(), Err(Error::MissingLocationId)));
  }
}
