//! HTTP layer for Hadir.
//!
//! Exposes an axum [`Router`] over the check-in gate and record queries,
//! backed by any [`RecordStore`].

pub mod attendance;
pub mod error;
pub mod session;

pub use error::ApiError;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use hadir_core::{
  clock::{CivilClock, Clock, DEFAULT_UTC_OFFSET_MINUTES},
  evidence::{DEFAULT_MAX_EVIDENCE_BYTES, EvidencePolicy},
  gate::CheckInGate,
  query::RecordQuery,
  session::DirectorySession,
  store::RecordStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HADIR_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Offset of the civil day from UTC. 420 is WIB (UTC+7).
  pub utc_offset_minutes: i32,
  pub max_evidence_bytes: usize,
  /// Header carrying the employee ID of the caller, set by the gateway.
  pub identity_header:    String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".into(),
      port:               3000,
      store_path:         PathBuf::from("hadir.db"),
      utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
      max_evidence_bytes: DEFAULT_MAX_EVIDENCE_BYTES,
      identity_header:    "x-employee-id".into(),
    }
  }
}

impl ServerConfig {
  /// Layer `path` (optional) and the `HADIR_` environment over the defaults.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("HADIR").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  /// The civil clock described by `utc_offset_minutes`, or `None` if the
  /// offset is out of range.
  pub fn civil_clock(&self, source: Arc<dyn Clock>) -> Option<CivilClock> {
    CivilClock::from_offset_minutes(self.utc_offset_minutes, source)
  }

  pub fn evidence_policy(&self) -> EvidencePolicy { EvidencePolicy::new(self.max_evidence_bytes) }

  /// Request body cap. Leaves room above the evidence limit so an oversized
  /// photo still reaches validation and gets a proper rejection.
  pub fn upload_limit(&self) -> usize {
    self.max_evidence_bytes.saturating_mul(2).saturating_add(64 * 1024)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub gate:     Arc<CheckInGate<S>>,
  pub query:    Arc<RecordQuery<S>>,
  pub sessions: Arc<DirectorySession<S>>,
  pub config:   Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      gate:     self.gate.clone(),
      query:    self.query.clone(),
      sessions: self.sessions.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S: RecordStore> AppState<S> {
  pub fn new(store: Arc<S>, clock: CivilClock, config: ServerConfig) -> Self {
    Self {
      gate:     Arc::new(CheckInGate::new(store.clone(), clock.clone(), config.evidence_policy())),
      query:    Arc::new(RecordQuery::new(store.clone(), clock)),
      sessions: Arc::new(DirectorySession::new(store)),
      config:   Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the attendance API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let upload_limit = state.config.upload_limit();

  Router::new()
    .route("/attendances/clock-in",      post(attendance::clock_in::<S>))
    .route("/attendances/me",            get(attendance::my_history::<S>))
    .route("/attendances/me/today",      get(attendance::today::<S>))
    .route("/attendances/all",           get(attendance::all::<S>))
    .route("/attendances/photos/{name}", get(attendance::photo::<S>))
    .layer(DefaultBodyLimit::max(upload_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
