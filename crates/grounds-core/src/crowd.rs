//! Crowd level — the discrete busyness bucket derived from an active
//! check-in count. Computed on demand, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How busy a location currently is.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CrowdLevel {
  Low,
  Moderate,
  High,
  VeryHigh,
}

impl CrowdLevel {
  /// Map an active-record count to a bucket. Total and monotonic.
  pub fn from_count(count: usize) -> Self {
    match count {
      0..=2 => Self::Low,
      3..=5 => Self::Moderate,
      6..=10 => Self::High,
      _ => Self::VeryHigh,
    }
  }
}

/// The status read model for a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdStatus {
  pub current_count: usize,
  pub level:         CrowdLevel,
  pub last_updated:  DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bucket_boundaries() {
    assert_eq!(CrowdLevel::from_count(0), CrowdLevel::Low);
    assert_eq!(CrowdLevel::from_count(2), CrowdLevel::Low);
    assert_eq!(CrowdLevel::from_count(3), CrowdLevel::Moderate);
    assert_eq!(CrowdLevel::from_count(5), CrowdLevel::Moderate);
    assert_eq!(CrowdLevel::from_count(6), CrowdLevel::High);
    assert_eq!(CrowdLevel::from_count(10), CrowdLevel::High);
    assert_eq!(CrowdLevel::from_count(11), CrowdLevel::VeryHigh);
    assert_eq!(CrowdLevel::from_count(usize::MAX), CrowdLevel::VeryHigh);
  }

  #[test]
  fn monotonic_in_count() {
    for count in 0..50 {
      assert!(
        CrowdLevel::from_count(count) <= CrowdLevel::from_count(count + 1),
        "level decreased between {count} and {}",
        count + 1
      );
    }
  }
}
