//! Signed session tokens and the caller-identity extractor.
//!
//! The identity provider lives outside this service; what reaches us is a
//! bearer token it (or the `--issue-token` helper) minted with the shared
//! secret. Token format: `v1.<payload>.<signature>`, where both parts are
//! URL-safe unpadded base64 and the signature is HMAC-SHA256 over the
//! encoded payload.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use grounds_core::{identity::Identity, store::VenueStore};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION_V1: &str = "v1";
const MAX_TOKEN_LEN: usize = 1024;

// ─── Key ─────────────────────────────────────────────────────────────────────

/// The shared signing secret for session tokens.
pub struct SessionKey {
  secret: Vec<u8>,
}

impl SessionKey {
  pub fn new(secret: impl Into<Vec<u8>>) -> Self {
    Self { secret: secret.into() }
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TokenError {
  #[error("token format invalid")]
  InvalidFormat,
  #[error("token version unsupported")]
  UnsupportedVersion,
  #[error("token signature mismatch")]
  InvalidSignature,
  #[error("token payload invalid")]
  InvalidPayload,
  #[error("token expired")]
  Expired,
  #[error("invalid signing key")]
  InvalidKey,
}

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
  subject_id:   String,
  display_name: Option<String>,
  verified:     bool,
  expires_at:   DateTime<Utc>,
}

// ─── Issue / verify ──────────────────────────────────────────────────────────

/// Mint a signed token for `identity`, valid for `ttl` from now.
pub fn issue_token(
  key: &SessionKey,
  identity: &Identity,
  ttl: Duration,
) -> Result<String, TokenError> {
  let payload = TokenPayload {
    subject_id:   identity.subject_id.clone(),
    display_name: identity.display_name.clone(),
    verified:     identity.verified,
    expires_at:   Utc::now() + ttl,
  };
  let payload_bytes =
    serde_json::to_vec(&payload).map_err(|_| TokenError::InvalidPayload)?;
  let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);

  let mut mac = HmacSha256::new_from_slice(&key.secret)
    .map_err(|_| TokenError::InvalidKey)?;
  mac.update(payload_part.as_bytes());
  let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

  Ok(format!("{TOKEN_VERSION_V1}.{payload_part}.{sig_part}"))
}

/// Verify a token's signature and expiry and return the carried identity.
pub fn verify_token(
  key: &SessionKey,
  token: &str,
  now: DateTime<Utc>,
) -> Result<Identity, TokenError> {
  if token.len() > MAX_TOKEN_LEN {
    return Err(TokenError::InvalidFormat);
  }

  let mut parts = token.splitn(3, '.');
  let version = parts.next().ok_or(TokenError::InvalidFormat)?;
  let payload_part = parts.next().ok_or(TokenError::InvalidFormat)?;
  let sig_part = parts.next().ok_or(TokenError::InvalidFormat)?;

  if version != TOKEN_VERSION_V1 {
    return Err(TokenError::UnsupportedVersion);
  }

  let mut mac = HmacSha256::new_from_slice(&key.secret)
    .map_err(|_| TokenError::InvalidKey)?;
  mac.update(payload_part.as_bytes());
  let sig = URL_SAFE_NO_PAD
    .decode(sig_part)
    .map_err(|_| TokenError::InvalidFormat)?;
  mac
    .verify_slice(&sig)
    .map_err(|_| TokenError::InvalidSignature)?;

  let payload_bytes = URL_SAFE_NO_PAD
    .decode(payload_part)
    .map_err(|_| TokenError::InvalidFormat)?;
  let payload: TokenPayload = serde_json::from_slice(&payload_bytes)
    .map_err(|_| TokenError::InvalidPayload)?;

  if payload.expires_at <= now {
    return Err(TokenError::Expired);
  }

  Ok(Identity {
    subject_id:   payload.subject_id,
    display_name: payload.display_name,
    verified:     payload.verified,
  })
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The caller's identity, if a valid bearer token accompanied the request.
///
/// A missing, malformed, expired, or badly-signed token makes the caller
/// anonymous rather than failing the request; route policy decides whether
/// anonymous access is acceptable.
pub struct Caller(pub Option<Identity>);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
}

impl<S> FromRequestParts<AppState<S>> for Caller
where
  S: VenueStore + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let identity = match bearer_token(&parts.headers) {
      None => None,
      Some(token) => {
        match verify_token(&state.sessions, token, Utc::now()) {
          Ok(identity) => Some(identity),
          Err(e) => {
            tracing::debug!("rejected session token: {e}");
            None
          }
        }
      }
    };
    Ok(Caller(identity))
  }
}
