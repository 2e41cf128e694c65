//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use grounds_core::{
  checkin::CheckIn,
  location::Location,
  review::NewReview,
  store::{AppendOutcome, VenueStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn record(subject: &str, location: &str, age_minutes: i64) -> CheckIn {
  CheckIn::new(subject, location, Utc::now() - Duration::minutes(age_minutes))
}

fn location(id: &str, name: &str) -> Location {
  Location {
    location_id: id.into(),
    name:        name.into(),
    address:     format!("{name} street"),
    created_at:  Utc::now(),
  }
}

fn review_input(location: &str, subject: &str, rating: u8) -> NewReview {
  NewReview {
    location_id: location.into(),
    subject_id:  subject.into(),
    author_name: "Bean Enthusiast".into(),
    body:        "The espresso was excellent.".into(),
    rating,
  }
}

/// Insert a (possibly backdated) record bypassing the guard.
async fn seed(s: &SqliteStore, check_in: CheckIn) {
  match s
    .record_check_in(check_in, Duration::zero())
    .await
    .unwrap()
  {
    AppendOutcome::Recorded(_) => {}
    AppendOutcome::Conflict(_) => panic!("seed conflicted"),
  }
}

// ─── Check-ins ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn count_active_filters_by_window() {
  let s = store().await;
  seed(&s, record("u1", "1", 15)).await;
  seed(&s, record("u2", "1", 89)).await;
  seed(&s, record("u3", "1", 91)).await; // expired

  assert_eq!(s.count_active("1", Utc::now()).await.unwrap(), 2);
}

#[tokio::test]
async fn count_active_unknown_location_is_zero() {
  let s = store().await;
  assert_eq!(s.count_active("nowhere", Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
async fn active_check_ins_newest_first() {
  let s = store().await;
  seed(&s, record("u1", "1", 30)).await;
  seed(&s, record("u2", "1", 10)).await;
  seed(&s, record("u3", "2", 5)).await; // other location

  let records = s.active_check_ins("1", Utc::now()).await.unwrap();
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].subject_id, "u2");
  assert_eq!(records[1].subject_id, "u1");
}

#[tokio::test]
async fn latest_check_in_respects_window() {
  let s = store().await;
  seed(&s, record("u1", "1", 100)).await;

  let now = Utc::now();
  let hit = s
    .latest_check_in("u1", "1", now, Duration::minutes(120))
    .await
    .unwrap();
  assert!(hit.is_some());

  let miss = s
    .latest_check_in("u1", "1", now, Duration::minutes(90))
    .await
    .unwrap();
  assert!(miss.is_none());
}

#[tokio::test]
async fn latest_check_in_returns_most_recent() {
  let s = store().await;
  seed(&s, record("u1", "1", 110)).await;
  seed(&s, record("u1", "1", 40)).await;

  let hit = s
    .latest_check_in("u1", "1", Utc::now(), Duration::minutes(120))
    .await
    .unwrap()
    .expect("record within window");
  assert!(Utc::now() - hit.recorded_at < Duration::minutes(41));
}

#[tokio::test]
async fn record_check_in_rejects_within_guard() {
  let s = store().await;
  let first = record("u1", "1", 10);
  seed(&s, first.clone()).await;

  let outcome = s
    .record_check_in(record("u1", "1", 0), Duration::minutes(120))
    .await
    .unwrap();
  match outcome {
    AppendOutcome::Conflict(existing) => {
      assert_eq!(existing.checkin_id, first.checkin_id)
    }
    AppendOutcome::Recorded(_) => panic!("expected conflict"),
  }

  // The losing write left nothing behind.
  assert_eq!(s.count_active("1", Utc::now()).await.unwrap(), 1);
}

#[tokio::test]
async fn record_check_in_allows_other_subjects() {
  let s = store().await;
  seed(&s, record("u1", "1", 0)).await;

  let outcome = s
    .record_check_in(record("u2", "1", 0), Duration::minutes(120))
    .await
    .unwrap();
  assert!(matches!(outcome, AppendOutcome::Recorded(_)));
  assert_eq!(s.count_active("1", Utc::now()).await.unwrap(), 2);
}

#[tokio::test]
async fn prune_before_removes_only_old_rows() {
  let s = store().await;
  seed(&s, record("u1", "1", 200)).await;
  seed(&s, record("u2", "1", 10)).await;

  let removed = s
    .prune_before(Utc::now() - Duration::minutes(90))
    .await
    .unwrap();
  assert_eq!(removed, 1);

  let records = s.active_check_ins("1", Utc::now()).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].subject_id, "u2");
}

// ─── Locations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_location() {
  let s = store().await;
  assert!(s.add_location(location("1", "Brew Haven")).await.unwrap());

  let view = s.get_location("1").await.unwrap().expect("location");
  assert_eq!(view.location.name, "Brew Haven");
  assert_eq!(view.review_count, 0);
  assert!(view.rating.is_none());
}

#[tokio::test]
async fn add_location_is_insert_if_absent() {
  let s = store().await;
  assert!(s.add_location(location("1", "Brew Haven")).await.unwrap());
  assert!(!s.add_location(location("1", "Renamed")).await.unwrap());

  // The original row survives.
  let view = s.get_location("1").await.unwrap().unwrap();
  assert_eq!(view.location.name, "Brew Haven");
}

#[tokio::test]
async fn get_location_missing_returns_none() {
  let s = store().await;
  assert!(s.get_location("404").await.unwrap().is_none());
}

#[tokio::test]
async fn list_locations_includes_aggregates() {
  let s = store().await;
  s.add_location(location("1", "Brew Haven")).await.unwrap();
  s.add_location(location("2", "The Roasted Bean")).await.unwrap();

  s.add_review(review_input("1", "u1", 5)).await.unwrap();
  s.add_review(review_input("1", "u2", 4)).await.unwrap();

  let views = s.list_locations().await.unwrap();
  assert_eq!(views.len(), 2);

  let first = views.iter().find(|v| v.location.location_id == "1").unwrap();
  assert_eq!(first.review_count, 2);
  assert_eq!(first.rating, Some(4.5));

  let second = views.iter().find(|v| v.location.location_id == "2").unwrap();
  assert_eq!(second.review_count, 0);
  assert!(second.rating.is_none());
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_review_and_list() {
  let s = store().await;
  let review = s.add_review(review_input("1", "u1", 5)).await.unwrap();
  assert_eq!(review.location_id, "1");
  assert_eq!(review.rating, 5);

  let views = s.reviews_for_location("1", None).await.unwrap();
  assert_eq!(views.len(), 1);
  assert_eq!(views[0].review.review_id, review.review_id);
  assert_eq!(views[0].votes.agree_count, 0);
  assert!(views[0].votes.caller_vote.is_none());
}

#[tokio::test]
async fn reviews_scoped_to_location() {
  let s = store().await;
  s.add_review(review_input("1", "u1", 5)).await.unwrap();
  s.add_review(review_input("2", "u2", 3)).await.unwrap();

  let views = s.reviews_for_location("1", None).await.unwrap();
  assert_eq!(views.len(), 1);
  assert_eq!(views[0].review.subject_id, "u1");
}

#[tokio::test]
async fn vote_and_tally() {
  let s = store().await;
  let review = s.add_review(review_input("1", "author", 4)).await.unwrap();

  let tally = s
    .vote_review(review.review_id, "v1", true)
    .await
    .unwrap()
    .expect("review exists");
  assert_eq!(tally.agree_count, 1);
  assert_eq!(tally.disagree_count, 0);
  assert_eq!(tally.caller_vote, Some(true));

  let tally = s
    .vote_review(review.review_id, "v2", false)
    .await
    .unwrap()
    .expect("review exists");
  assert_eq!(tally.agree_count, 1);
  assert_eq!(tally.disagree_count, 1);
  assert_eq!(tally.caller_vote, Some(false));
}

#[tokio::test]
async fn revote_replaces_previous_vote() {
  let s = store().await;
  let review = s.add_review(review_input("1", "author", 4)).await.unwrap();

  s.vote_review(review.review_id, "v1", true).await.unwrap();
  let tally = s
    .vote_review(review.review_id, "v1", false)
    .await
    .unwrap()
    .expect("review exists");

  assert_eq!(tally.agree_count, 0);
  assert_eq!(tally.disagree_count, 1);
  assert_eq!(tally.caller_vote, Some(false));
}

#[tokio::test]
async fn caller_vote_resolved_in_listing() {
  let s = store().await;
  let review = s.add_review(review_input("1", "author", 4)).await.unwrap();
  s.vote_review(review.review_id, "v1", true).await.unwrap();

  let for_voter = s.reviews_for_location("1", Some("v1")).await.unwrap();
  assert_eq!(for_voter[0].votes.caller_vote, Some(true));

  let for_other = s.reviews_for_location("1", Some("v2")).await.unwrap();
  assert!(for_other[0].votes.caller_vote.is_none());
}

#[tokio::test]
async fn vote_on_unknown_review_returns_none() {
  let s = store().await;
  let tally = s.vote_review(Uuid::new_v4(), "v1", true).await.unwrap();
  assert!(tally.is_none());
}
