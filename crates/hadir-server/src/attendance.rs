//! Attendance handlers: check-in, personal history, and the HR recap.

use axum::{
  Json,
  extract::{Multipart, Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use hadir_core::{
  clock::DayKey,
  evidence::Evidence,
  gate::CheckInOutcome,
  query::RecordFilter,
  record::{AttendanceRecord, PhotoRef},
  store::RecordStore,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppState, error::ApiError, session::CurrentActor};

/// Multipart field carrying the photo.
const PHOTO_FIELD: &str = "photo";
/// Multipart field carrying the client's own clock reading. Logged only.
const TIMESTAMP_FIELD: &str = "timestamp";

// ─── Check-in ────────────────────────────────────────────────────────────────

pub async fn clock_in<S>(
  State(state): State<AppState<S>>,
  CurrentActor(actor): CurrentActor,
  mut multipart: Multipart,
) -> Result<Response, ApiError>
where
  S: RecordStore + 'static,
{
  let mut evidence = None;

  while let Some(field) = multipart.next_field().await? {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some(PHOTO_FIELD) => {
        let media_type = field.content_type().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        evidence = Some(Evidence { media_type, file_name, bytes });
      }
      Some(TIMESTAMP_FIELD) => {
        let claimed = field.text().await?;
        debug!(employee_id = %actor.employee_id, %claimed, "client timestamp ignored");
      }
      _ => {}
    }
  }

  match state.gate.attempt_check_in(&actor.employee_id, evidence).await? {
    CheckInOutcome::Accepted(record) => Ok((StatusCode::CREATED, Json(record)).into_response()),
    CheckInOutcome::Rejected(rejection) => Err(ApiError::Rejected(rejection)),
  }
}

// ─── Personal views ──────────────────────────────────────────────────────────

pub async fn my_history<S>(
  State(state): State<AppState<S>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError>
where
  S: RecordStore + 'static,
{
  Ok(Json(state.query.my_history(&actor.employee_id).await?))
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodayStatus {
  pub day:        DayKey,
  pub checked_in: bool,
}

pub async fn today<S>(
  State(state): State<AppState<S>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<TodayStatus>, ApiError>
where
  S: RecordStore + 'static,
{
  let day = state.query.clock().today();
  let checked_in = state.query.has_record_on(&actor.employee_id, day).await?;
  Ok(Json(TodayStatus { day, checked_in }))
}

// ─── HR recap ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RecapParams {
  pub search: Option<String>,
  /// `YYYY-MM-DD`. Parsed by hand so a malformed value gets a JSON 400.
  pub date:   Option<String>,
}

impl RecapParams {
  fn into_filter(self) -> Result<RecordFilter, ApiError> {
    let date = match self.date.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(raw) => Some(raw.parse::<DayKey>()?),
    };
    Ok(RecordFilter { search_term: self.search, date })
  }
}

pub async fn all<S>(
  State(state): State<AppState<S>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<RecapParams>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError>
where
  S: RecordStore + 'static,
{
  let filter = params.into_filter()?;
  Ok(Json(state.query.all_records(&actor, &filter).await?))
}

// ─── Evidence ────────────────────────────────────────────────────────────────

pub async fn photo<S>(
  State(state): State<AppState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(name): Path<String>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: RecordStore + 'static,
{
  let photo_ref = PhotoRef::new(format!("photos/{name}"));
  let evidence = state
    .query
    .evidence(&actor, &photo_ref)
    .await?
    .ok_or_else(|| ApiError::NotFound(photo_ref.to_string()))?;

  let etag = format!("\"{}\"", evidence.content_hash);
  let fresh = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| none_match_hits(v, &evidence.content_hash));

  if fresh {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(
    (
      StatusCode::OK,
      [
        (header::CONTENT_TYPE, evidence.format.media_type().to_owned()),
        (header::ETAG, etag),
        (header::CACHE_CONTROL, "private".to_owned()),
      ],
      evidence.bytes,
    )
      .into_response(),
  )
}

/// Whether an `If-None-Match` value names the entity tagged `hash`. Weak
/// comparison: a `W/` prefix is ignored, and `*` matches any entity.
fn none_match_hits(header_value: &str, hash: &str) -> bool {
  header_value.split(',').map(str::trim).any(|tag| {
    tag == "*" || tag.strip_prefix("W/").unwrap_or(tag).trim_matches('"') == hash
  })
}
