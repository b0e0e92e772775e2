//! Error types for `hadir-core`.
//!
//! Business rejections (bad evidence, a second check-in on the same day) are
//! not errors; they are returned as [`crate::gate::CheckInOutcome`] values.
//! Everything here is a genuine failure of the operation.

use thiserror::Error;

use crate::employee::EmployeeId;

#[derive(Debug, Error)]
pub enum Error {
  /// The record store failed or timed out. Retryable by the caller.
  #[error("record store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("employee {0} is not authorised for this view")]
  Unauthorized(EmployeeId),

  #[error("unknown employee: {0}")]
  UnknownEmployee(EmployeeId),

  #[error("invalid day key {0:?}, expected YYYY-MM-DD")]
  InvalidDayKey(String),
}

impl Error {
  /// Wrap a backend error as [`Error::StoreUnavailable`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(e))
  }

  /// Whether the caller may reasonably retry the same request later.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::StoreUnavailable(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
