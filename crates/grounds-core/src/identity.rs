//! The authenticated caller, as supplied by the session layer.

use serde::{Deserialize, Serialize};

/// Who is making the request. Produced from a signed session token; the
/// identity provider itself lives outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  /// Stable opaque identifier for the subject (e.g. a nullifier hash).
  /// Never the raw identity-proof material.
  pub subject_id:   String,
  pub display_name: Option<String>,
  /// Whether the subject has completed proof-of-personhood verification —
  /// a stricter condition than being signed in.
  pub verified:     bool,
}

impl Identity {
  /// Name shown on authored content.
  pub fn author_name(&self) -> &str {
    self.display_name.as_deref().unwrap_or("Anonymous")
  }
}
