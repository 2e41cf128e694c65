//! In-memory [`VenueStore`] used by tests.
//!
//! Production deployments use `grounds-store-sqlite`; this implementation
//! exists so service-level tests run without a database. A single mutex
//! guards all tables, and [`VenueStore::record_check_in`] holds it across
//! the check and the insert — that is what makes the compare-and-append
//! atomic here.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
  Error,
  checkin::CheckIn,
  location::{Location, LocationView},
  review::{NewReview, Review, ReviewView, ReviewVote, VoteTally},
  store::{AppendOutcome, VenueStore},
};

#[derive(Default)]
struct Tables {
  check_ins: Vec<CheckIn>,
  locations: Vec<Location>,
  reviews:   Vec<Review>,
  votes:     Vec<ReviewVote>,
}

/// A `VenueStore` backed by mutex-guarded vectors.
#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, Tables> {
    self.tables.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn tally_for(votes: &[ReviewVote], review_id: Uuid, caller: Option<&str>) -> VoteTally {
  let mut tally = VoteTally::default();
  for vote in votes.iter().filter(|v| v.review_id == review_id) {
    if vote.agree {
      tally.agree_count += 1;
    } else {
      tally.disagree_count += 1;
    }
    if caller == Some(vote.subject_id.as_str()) {
      tally.caller_vote = Some(vote.agree);
    }
  }
  tally
}

fn view_for(tables: &Tables, location: &Location) -> LocationView {
  let ratings: Vec<u8> = tables
    .reviews
    .iter()
    .filter(|r| r.location_id == location.location_id)
    .map(|r| r.rating)
    .collect();
  let rating = if ratings.is_empty() {
    None
  } else {
    Some(ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64)
  };
  LocationView {
    location:     location.clone(),
    rating,
    review_count: ratings.len(),
  }
}

impl VenueStore for MemoryStore {
  type Error = Error;

  // ── Check-ins ─────────────────────────────────────────────────────────

  async fn record_check_in(
    &self,
    check_in: CheckIn,
    guard_window: Duration,
  ) -> Result<AppendOutcome, Error> {
    let mut tables = self.lock();
    let conflict = tables
      .check_ins
      .iter()
      .filter(|e| {
        e.subject_id == check_in.subject_id
          && e.location_id == check_in.location_id
          && check_in.recorded_at - e.recorded_at < guard_window
      })
      .max_by_key(|e| e.recorded_at)
      .cloned();

    if let Some(existing) = conflict {
      return Ok(AppendOutcome::Conflict(existing));
    }
    tables.check_ins.push(check_in.clone());
    Ok(AppendOutcome::Recorded(check_in))
  }

  async fn count_active(&self, location_id: &str, now: DateTime<Utc>) -> Result<usize, Error> {
    Ok(
      self
        .lock()
        .check_ins
        .iter()
        .filter(|c| c.location_id == location_id && c.is_active(now))
        .count(),
    )
  }

  async fn active_check_ins(
    &self,
    location_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Vec<CheckIn>, Error> {
    let mut records: Vec<CheckIn> = self
      .lock()
      .check_ins
      .iter()
      .filter(|c| c.location_id == location_id && c.is_active(now))
      .cloned()
      .collect();
    records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    Ok(records)
  }

  async fn latest_check_in(
    &self,
    subject_id: &str,
    location_id: &str,
    now: DateTime<Utc>,
    window: Duration,
  ) -> Result<Option<CheckIn>, Error> {
    Ok(
      self
        .lock()
        .check_ins
        .iter()
        .filter(|c| {
          c.subject_id == subject_id
            && c.location_id == location_id
            && now - c.recorded_at < window
        })
        .max_by_key(|c| c.recorded_at)
        .cloned(),
    )
  }

  async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, Error> {
    let mut tables = self.lock();
    let before = tables.check_ins.len();
    tables.check_ins.retain(|c| c.recorded_at > cutoff);
    Ok(before - tables.check_ins.len())
  }

  // ── Locations ─────────────────────────────────────────────────────────

  async fn add_location(&self, location: Location) -> Result<bool, Error> {
    let mut tables = self.lock();
    if tables
      .locations
      .iter()
      .any(|l| l.location_id == location.location_id)
    {
      return Ok(false);
    }
    tables.locations.push(location);
    Ok(true)
  }

  async fn get_location(&self, location_id: &str) -> Result<Option<LocationView>, Error> {
    let tables = self.lock();
    Ok(
      tables
        .locations
        .iter()
        .find(|l| l.location_id == location_id)
        .map(|l| view_for(&tables, l)),
    )
  }

  async fn list_locations(&self) -> Result<Vec<LocationView>, Error> {
    let tables = self.lock();
    Ok(
      tables
        .locations
        .iter()
        .map(|l| view_for(&tables, l))
        .collect(),
    )
  }

  // ── Reviews ───────────────────────────────────────────────────────────

  async fn add_review(&self, input: NewReview) -> Result<Review, Error> {
    let review = Review {
      review_id:   Uuid::new_v4(),
      location_id: input.location_id,
      subject_id:  input.subject_id,
      author_name: input.author_name,
      body:        input.body,
      rating:      input.rating,
      created_at:  Utc::now(),
    };
    self.lock().reviews.push(review.clone());
    Ok(review)
  }

  async fn reviews_for_location(
    &self,
    location_id: &str,
    caller: Option<&str>,
  ) -> Result<Vec<ReviewView>, Error> {
    let tables = self.lock();
    let mut reviews: Vec<&Review> = tables
      .reviews
      .iter()
      .filter(|r| r.location_id == location_id)
      .collect();
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(
      reviews
        .into_iter()
        .map(|r| ReviewView {
          review: r.clone(),
          votes:  tally_for(&tables.votes, r.review_id, caller),
        })
        .collect(),
    )
  }

  async fn vote_review(
    &self,
    review_id: Uuid,
    subject_id: &str,
    agree: bool,
  ) -> Result<Option<VoteTally>, Error> {
    let mut tables = self.lock();
    if !tables.reviews.iter().any(|r| r.review_id == review_id) {
      return Ok(None);
    }

    let now = Utc::now();
    match tables
      .votes
      .iter_mut()
      .find(|v| v.review_id == review_id && v.subject_id == subject_id)
    {
      Some(existing) => {
        existing.agree = agree;
        existing.recorded_at = now;
      }
      None => tables.votes.push(ReviewVote {
        vote_id: Uuid::new_v4(),
        review_id,
        subject_id: subject_id.to_owned(),
        agree,
        recorded_at: now,
      }),
    }

    Ok(Some(tally_for(&tables.votes, review_id, Some(subject_id))))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::checkin::validity_window;

  fn record(subject: &str, location: &str, age_minutes: i64) -> CheckIn {
    CheckIn::new(subject, location, Utc::now() - Duration::minutes(age_minutes))
  }

  #[tokio::test]
  async fn compare_and_append_rejects_within_guard() {
    let store = MemoryStore::new();
    let first = record("s1", "l1", 10);
    assert!(matches!(
      store
        .record_check_in(first.clone(), Duration::zero())
        .await
        .unwrap(),
      AppendOutcome::Recorded(_)
    ));

    let second = record("s1", "l1", 0);
    match store
      .record_check_in(second, Duration::minutes(120))
      .await
      .unwrap()
    {
      AppendOutcome::Conflict(existing) => {
        assert_eq!(existing.checkin_id, first.checkin_id)
      }
      AppendOutcome::Recorded(_) => panic!("expected conflict"),
    }

    // Nothing was written by the losing call.
    let now = Utc::now();
    assert_eq!(store.count_active("l1", now).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn prune_removes_only_expired() {
    let store = MemoryStore::new();
    store
      .record_check_in(record("s1", "l1", 200), Duration::zero())
      .await
      .unwrap();
    store
      .record_check_in(record("s2", "l1", 10), Duration::zero())
      .await
      .unwrap();

    let cutoff = Utc::now() - validity_window();
    assert_eq!(store.prune_before(cutoff).await.unwrap(), 1);
    assert_eq!(store.count_active("l1", Utc::now()).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn vote_upsert_replaces_previous_vote() {
    let store = MemoryStore::new();
    let review = store
      .add_review(NewReview {
        location_id: "1".into(),
        subject_id:  "author".into(),
        author_name: "Author".into(),
        body:        "Solid flat white.".into(),
        rating:      4,
      })
      .await
      .unwrap();

    let first = store
      .vote_review(review.review_id, "voter", true)
      .await
      .unwrap()
      .expect("review exists");
    assert_eq!(first.agree_count, 1);
    assert_eq!(first.disagree_count, 0);
    assert_eq!(first.caller_vote, Some(true));

    let second = store
      .vote_review(review.review_id, "voter", false)
      .await
      .unwrap()
      .expect("review exists");
    assert_eq!(second.agree_count, 0);
    assert_eq!(second.disagree_count, 1);
    assert_eq!(second.caller_vote, Some(false));
  }

  #[tokio::test]
  async fn vote_on_unknown_review_returns_none() {
    let store = MemoryStore::new();
    let tally = store
      .vote_review(Uuid::new_v4(), "voter", true)
      .await
      .unwrap();
    assert!(tally.is_none());
  }

  #[tokio::test]
  async fn location_view_aggregates_reviews() {
    let store = MemoryStore::new();
    store
      .add_location(Location {
        location_id: "1".into(),
        name:        "Brew Haven".into(),
        address:     "123 Coffee Lane".into(),
        created_at:  Utc::now(),
      })
      .await
      .unwrap();

    for rating in [5, 4] {
      store
        .add_review(NewReview {
          location_id: "1".into(),
          subject_id:  format!("s{rating}"),
          author_name: "Reviewer".into(),
          body:        "good".into(),
          rating,
        })
        .await
        .unwrap();
    }

    let view = store.get_location("1").await.unwrap().unwrap();
    assert_eq!(view.review_count, 2);
    assert_eq!(view.rating, Some(4.5));
  }
}
