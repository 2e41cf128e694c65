//! grounds-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, seeds any configured locations, and serves the
//! Grounds JSON API over HTTP.
//!
//! # Session token generation
//!
//! The identity provider is external; for development and operational
//! testing, mint a token with the configured secret:
//!
//! ```
//! cargo run -p grounds-server --bin server -- --issue-token 0xabc123
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::{Duration, Utc};
use clap::Parser;
use grounds_api::{AppState, SessionKey, api_router, session};
use grounds_core::{identity::Identity, location::Location, store::VenueStore as _};
use grounds_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Grounds crowd-tracker server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Mint a session token for the given subject id and exit.
  #[arg(long, value_name = "SUBJECT")]
  issue_token: Option<String>,

  /// Display name embedded in the minted token.
  #[arg(long, requires = "issue_token")]
  display_name: Option<String>,

  /// Mint the token without the verified flag.
  #[arg(long, requires = "issue_token")]
  unverified: bool,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  host:              String,
  port:              u16,
  store_path:        PathBuf,
  session_secret:    String,
  #[serde(default = "default_session_ttl_hours")]
  session_ttl_hours: i64,
  /// Locations provisioned at startup if not already present.
  #[serde(default)]
  locations:         Vec<SeedLocation>,
}

fn default_session_ttl_hours() -> i64 { 720 }

#[derive(Debug, Clone, Deserialize)]
struct SeedLocation {
  location_id: String,
  name:        String,
  address:     String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GROUNDS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Helper mode: mint a session token and exit.
  if let Some(subject) = cli.issue_token {
    let key = SessionKey::new(server_cfg.session_secret.clone());
    let identity = Identity {
      subject_id:   subject,
      display_name: cli.display_name,
      verified:     !cli.unverified,
    };
    let token = session::issue_token(
      &key,
      &identity,
      Duration::hours(server_cfg.session_ttl_hours),
    )
    .map_err(|e| anyhow::anyhow!("token error: {e}"))?;
    println!("{token}");
    return Ok(());
  }

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Provision configured locations.
  for seed in &server_cfg.locations {
    let inserted = store
      .add_location(Location {
        location_id: seed.location_id.clone(),
        name:        seed.name.clone(),
        address:     seed.address.clone(),
        created_at:  Utc::now(),
      })
      .await
      .with_context(|| format!("failed to seed location {}", seed.location_id))?;
    if inserted {
      tracing::info!(location = %seed.location_id, name = %seed.name, "seeded location");
    }
  }

  // Build application state and router.
  let state = AppState::new(
    Arc::new(store),
    SessionKey::new(server_cfg.session_secret.clone()),
  );
  let app = axum::Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
