//! The `RecordStore` trait: the persistence boundary of the engine.
//!
//! Implemented by storage backends (e.g. `hadir-store-sqlite`). The gate and
//! the query engine depend on this abstraction, never on a concrete backend.

use std::future::Future;

use crate::{
  employee::{Employee, EmployeeId},
  evidence::ValidEvidence,
  record::{AttendanceRecord, NewRecord, PhotoRef, StoredEvidence},
};

/// Result of [`RecordStore::append_record`].
#[derive(Debug, Clone)]
pub enum AppendOutcome {
  /// The record was persisted; `id` has been assigned.
  Appended(AttendanceRecord),
  /// The store already holds a record for this `(employee_id, day_key)`.
  /// Reported as a value so concurrent submissions can be told apart from
  /// genuine storage failures.
  DuplicateDay,
}

/// Abstraction over an attendance store backend.
///
/// Records are append-only. The backend must enforce uniqueness of
/// `(employee_id, day_key)` atomically at insert time; the engine holds no
/// locks of its own.
///
/// All methods return `Send` futures so the trait can be shared across a
/// multi-threaded runtime.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Employee directory (read-only) ────────────────────────────────────

  /// Look up an employee. Returns `None` if the ID is unknown.
  fn get_employee<'a>(
    &'a self,
    employee_id: &'a EmployeeId,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + 'a;

  // ── Evidence blobs ────────────────────────────────────────────────────

  /// Persist validated evidence on behalf of `owner` and return a
  /// retrievable reference to it.
  fn put_evidence<'a>(
    &'a self,
    owner: &'a EmployeeId,
    evidence: ValidEvidence,
  ) -> impl Future<Output = Result<PhotoRef, Self::Error>> + Send + 'a;

  /// Read evidence back. Returns `None` for an unknown reference.
  fn load_evidence<'a>(
    &'a self,
    photo_ref: &'a PhotoRef,
  ) -> impl Future<Output = Result<Option<StoredEvidence>, Self::Error>> + Send + 'a;

  /// Remove evidence that no record refers to. A referenced blob is left in
  /// place.
  fn discard_evidence<'a>(
    &'a self,
    photo_ref: &'a PhotoRef,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Records ───────────────────────────────────────────────────────────

  /// Append a record, assigning its ID. A uniqueness conflict on
  /// `(employee_id, day_key)` yields [`AppendOutcome::DuplicateDay`].
  fn append_record(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<AppendOutcome, Self::Error>> + Send + '_;

  /// All records for one employee, in storage (insertion) order.
  fn records_for<'a>(
    &'a self,
    employee_id: &'a EmployeeId,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + 'a;

  /// Every record, in storage (insertion) order.
  fn all_records(
    &self,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;
}
