//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hadir_core::gate::Rejection;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable identity was supplied by the upstream gateway.
  #[error("no authenticated session")]
  Unauthenticated,

  #[error("not found: {0}")]
  NotFound(String),

  /// A check-in was refused. Not a fault; the body tells the employee why.
  #[error("check-in rejected: {0}")]
  Rejected(Rejection),

  #[error("malformed upload: {0}")]
  Multipart(#[from] MultipartError),

  #[error(transparent)]
  Core(#[from] hadir_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use hadir_core::Error as Core;

    let (status, body) = match &self {
      ApiError::Unauthenticated => {
        (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() }))
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Rejected(r) => {
        let status = match r {
          Rejection::AlreadyCheckedInToday => StatusCode::CONFLICT,
          Rejection::Evidence(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, json!({ "error": r.to_string(), "reason": r.code() }))
      }
      ApiError::Multipart(e) => (e.status(), json!({ "error": e.body_text() })),
      ApiError::Core(e @ Core::StoreUnavailable(_)) => (
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": e.to_string(), "retryable": true }),
      ),
      ApiError::Core(e @ Core::Unauthorized(_)) => {
        (StatusCode::FORBIDDEN, json!({ "error": e.to_string() }))
      }
      ApiError::Core(e @ Core::UnknownEmployee(_)) => {
        (StatusCode::NOT_FOUND, json!({ "error": e.to_string() }))
      }
      ApiError::Core(e @ Core::InvalidDayKey(_)) => {
        (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
      }
    };

    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(body)).into_response()
  }
}
