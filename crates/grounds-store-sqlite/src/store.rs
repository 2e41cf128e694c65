//! [`SqliteStore`] — the SQLite implementation of [`VenueStore`].

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use grounds_core::{
  checkin::{CheckIn, validity_window},
  location::{Location, LocationView},
  review::{NewReview, Review, ReviewView, VoteTally},
  store::{AppendOutcome, VenueStore},
};

use crate::{
  Error, Result,
  encode::{RawCheckIn, RawLocation, RawReview, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Grounds venue store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// writes flow through one connection, so the compare-and-append in
/// [`VenueStore::record_check_in`] runs its check and insert in a single
/// transaction that concurrent callers cannot interleave.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── VenueStore impl ─────────────────────────────────────────────────────────

impl VenueStore for SqliteStore {
  type Error = Error;

  // ── Check-ins ─────────────────────────────────────────────────────────

  async fn record_check_in(
    &self,
    check_in: CheckIn,
    guard_window: Duration,
  ) -> Result<AppendOutcome> {
    let id_str      = encode_uuid(check_in.checkin_id);
    let subject     = check_in.subject_id.clone();
    let location    = check_in.location_id.clone();
    let at_str      = encode_dt(check_in.recorded_at);
    let threshold   = encode_dt(check_in.recorded_at - guard_window);

    let conflict: Option<RawCheckIn> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            "SELECT checkin_id, subject_id, location_id, recorded_at
               FROM check_ins
              WHERE subject_id = ?1 AND location_id = ?2 AND recorded_at > ?3
              ORDER BY recorded_at DESC
              LIMIT 1",
            rusqlite::params![subject, location, threshold],
            |row| {
              Ok(RawCheckIn {
                checkin_id:  row.get(0)?,
                subject_id:  row.get(1)?,
                location_id: row.get(2)?,
                recorded_at: row.get(3)?,
              })
            },
          )
          .optional()?;

        if existing.is_none() {
          tx.execute(
            "INSERT INTO check_ins (checkin_id, subject_id, location_id, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id_str, subject, location, at_str],
          )?;
        }

        tx.commit()?;
        Ok(existing)
      })
      .await?;

    match conflict {
      Some(raw) => Ok(AppendOutcome::Conflict(raw.into_check_in()?)),
      None => Ok(AppendOutcome::Recorded(check_in)),
    }
  }

  async fn count_active(&self, location_id: &str, now: DateTime<Utc>) -> Result<usize> {
    let location = location_id.to_owned();
    let cutoff   = encode_dt(now - validity_window());

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM check_ins
            WHERE location_id = ?1 AND recorded_at > ?2",
          rusqlite::params![location, cutoff],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as usize)
  }

  async fn active_check_ins(
    &self,
    location_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Vec<CheckIn>> {
    let location = location_id.to_owned();
    let cutoff   = encode_dt(now - validity_window());

    let raws: Vec<RawCheckIn> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT checkin_id, subject_id, location_id, recorded_at
             FROM check_ins
            WHERE location_id = ?1 AND recorded_at > ?2
            ORDER BY recorded_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![location, cutoff], |row| {
            Ok(RawCheckIn {
              checkin_id:  row.get(0)?,
              subject_id:  row.get(1)?,
              location_id: row.get(2)?,
              recorded_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCheckIn::into_check_in).collect()
  }

  async fn latest_check_in(
    &self,
    subject_id: &str,
    location_id: &str,
    now: DateTime<Utc>,
    window: Duration,
  ) -> Result<Option<CheckIn>> {
    let subject   = subject_id.to_owned();
    let location  = location_id.to_owned();
    let threshold = encode_dt(now - window);

    let raw: Option<RawCheckIn> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT checkin_id, subject_id, location_id, recorded_at
                 FROM check_ins
                WHERE subject_id = ?1 AND location_id = ?2 AND recorded_at > ?3
                ORDER BY recorded_at DESC
                LIMIT 1",
              rusqlite::params![subject, location, threshold],
              |row| {
                Ok(RawCheckIn {
                  checkin_id:  row.get(0)?,
                  subject_id:  row.get(1)?,
                  location_id: row.get(2)?,
                  recorded_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCheckIn::into_check_in).transpose()
  }

  async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
    let cutoff_str = encode_dt(cutoff);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM check_ins WHERE recorded_at <= ?1",
          rusqlite::params![cutoff_str],
        )?)
      })
      .await?;

    Ok(removed)
  }

  // ── Locations ─────────────────────────────────────────────────────────

  async fn add_location(&self, location: Location) -> Result<bool> {
    let id_str   = location.location_id;
    let name     = location.name;
    let address  = location.address;
    let at_str   = encode_dt(location.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO locations (location_id, name, address, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, address, at_str],
        )?)
      })
      .await?;

    Ok(inserted > 0)
  }

  async fn get_location(&self, location_id: &str) -> Result<Option<LocationView>> {
    let location = location_id.to_owned();

    let raw: Option<RawLocation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT l.location_id, l.name, l.address, l.created_at,
                      AVG(r.rating)       AS rating,
                      COUNT(r.review_id)  AS review_count
                 FROM locations l
                 LEFT JOIN reviews r ON r.location_id = l.location_id
                WHERE l.location_id = ?1
                GROUP BY l.location_id",
              rusqlite::params![location],
              |row| {
                Ok(RawLocation {
                  location_id:  row.get(0)?,
                  name:         row.get(1)?,
                  address:      row.get(2)?,
                  created_at:   row.get(3)?,
                  rating:       row.get(4)?,
                  review_count: row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|r| {
        let (location, rating, review_count) = r.into_location()?;
        Ok(LocationView { location, rating, review_count })
      })
      .transpose()
  }

  async fn list_locations(&self) -> Result<Vec<LocationView>> {
    let raws: Vec<RawLocation> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT l.location_id, l.name, l.address, l.created_at,
                  AVG(r.rating)       AS rating,
                  COUNT(r.review_id)  AS review_count
             FROM locations l
             LEFT JOIN reviews r ON r.location_id = l.location_id
            GROUP BY l.location_id
            ORDER BY l.location_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawLocation {
              location_id:  row.get(0)?,
              name:         row.get(1)?,
              address:      row.get(2)?,
              created_at:   row.get(3)?,
              rating:       row.get(4)?,
              review_count: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|r| {
        let (location, rating, review_count) = r.into_location()?;
        Ok(LocationView { location, rating, review_count })
      })
      .collect()
  }

  // ── Reviews ───────────────────────────────────────────────────────────

  async fn add_review(&self, input: NewReview) -> Result<Review> {
    let review = Review {
      review_id:   Uuid::new_v4(),
      location_id: input.location_id,
      subject_id:  input.subject_id,
      author_name: input.author_name,
      body:        input.body,
      rating:      input.rating,
      created_at:  Utc::now(),
    };

    let id_str   = encode_uuid(review.review_id);
    let location = review.location_id.clone();
    let subject  = review.subject_id.clone();
    let author   = review.author_name.clone();
    let body     = review.body.clone();
    let rating   = i64::from(review.rating);
    let at_str   = encode_dt(review.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reviews (
             review_id, location_id, subject_id, author_name, body, rating, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, location, subject, author, body, rating, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(review)
  }

  async fn reviews_for_location(
    &self,
    location_id: &str,
    caller: Option<&str>,
  ) -> Result<Vec<ReviewView>> {
    let location    = location_id.to_owned();
    let caller_id   = caller.map(str::to_owned);

    type Row = (RawReview, i64, i64, Option<i64>);
    let rows: Vec<Row> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.review_id, r.location_id, r.subject_id, r.author_name,
                  r.body, r.rating, r.created_at,
                  COALESCE(SUM(CASE WHEN v.agree = 1 THEN 1 ELSE 0 END), 0),
                  COALESCE(SUM(CASE WHEN v.agree = 0 THEN 1 ELSE 0 END), 0),
                  (SELECT v2.agree FROM review_votes v2
                    WHERE v2.review_id = r.review_id AND v2.subject_id = ?2)
             FROM reviews r
             LEFT JOIN review_votes v ON v.review_id = r.review_id
            WHERE r.location_id = ?1
            GROUP BY r.review_id
            ORDER BY r.created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![location, caller_id], |row| {
            Ok((
              RawReview {
                review_id:   row.get(0)?,
                location_id: row.get(1)?,
                subject_id:  row.get(2)?,
                author_name: row.get(3)?,
                body:        row.get(4)?,
                rating:      row.get(5)?,
                created_at:  row.get(6)?,
              },
              row.get(7)?,
              row.get(8)?,
              row.get(9)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(raw, agree, disagree, caller_vote)| {
        Ok(ReviewView {
          review: raw.into_review()?,
          votes:  VoteTally {
            agree_count:    agree as usize,
            disagree_count: disagree as usize,
            caller_vote:    caller_vote.map(|v| v != 0),
          },
        })
      })
      .collect()
  }

  async fn vote_review(
    &self,
    review_id: Uuid,
    subject_id: &str,
    agree: bool,
  ) -> Result<Option<VoteTally>> {
    let review_str = encode_uuid(review_id);
    let vote_str   = encode_uuid(Uuid::new_v4());
    let subject    = subject_id.to_owned();
    let agree_int  = i64::from(agree);
    let at_str     = encode_dt(Utc::now());

    type Tally = (i64, i64, Option<i64>);
    let result: Option<Tally> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM reviews WHERE review_id = ?1",
            rusqlite::params![review_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !exists {
          tx.commit()?;
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO review_votes (vote_id, review_id, subject_id, agree, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (review_id, subject_id)
           DO UPDATE SET agree = excluded.agree, recorded_at = excluded.recorded_at",
          rusqlite::params![vote_str, review_str, subject, agree_int, at_str],
        )?;

        let tally = tx.query_row(
          "SELECT COALESCE(SUM(CASE WHEN agree = 1 THEN 1 ELSE 0 END), 0),
                  COALESCE(SUM(CASE WHEN agree = 0 THEN 1 ELSE 0 END), 0),
                  (SELECT agree FROM review_votes
                    WHERE review_id = ?1 AND subject_id = ?2)
             FROM review_votes
            WHERE review_id = ?1",
          rusqlite::params![review_str, subject],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        tx.commit()?;
        Ok(Some(tally))
      })
      .await?;

    Ok(result.map(|(agree_count, disagree_count, caller_vote)| VoteTally {
      agree_count:    agree_count as usize,
      disagree_count: disagree_count as usize,
      caller_vote:    caller_vote.map(|v| v != 0),
    }))
  }
}
