//! SQL schema for the Grounds SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS locations (
    location_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    address     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Check-ins are append-only while live; expired rows are deleted as
-- housekeeping. No UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS check_ins (
    checkin_id  TEXT PRIMARY KEY,
    subject_id  TEXT NOT NULL,
    location_id TEXT NOT NULL,
    recorded_at TEXT NOT NULL    -- ISO 8601 UTC; assigned at creation
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   TEXT PRIMARY KEY,
    location_id TEXT NOT NULL,
    subject_id  TEXT NOT NULL,
    author_name TEXT NOT NULL,
    body        TEXT NOT NULL,
    rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    created_at  TEXT NOT NULL
);

-- One vote per subject per review; re-voting updates the row in place.
CREATE TABLE IF NOT EXISTS review_votes (
    vote_id     TEXT PRIMARY KEY,
    review_id   TEXT NOT NULL REFERENCES reviews(review_id),
    subject_id  TEXT NOT NULL,
    agree       INTEGER NOT NULL,
    recorded_at TEXT NOT NULL,
    UNIQUE (review_id, subject_id)
);

CREATE INDEX IF NOT EXISTS check_ins_location_idx
    ON check_ins(location_id, recorded_at);
CREATE INDEX IF NOT EXISTS check_ins_subject_idx
    ON check_ins(subject_id, location_id, recorded_at);
CREATE INDEX IF NOT EXISTS reviews_location_idx
    ON reviews(location_id);

PRAGMA user_version = 1;
";
