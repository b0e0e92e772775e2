//! The check-in gate: at most one accepted check-in per employee per civil
//! day.
//!
//! Per `(employee, day)` the state moves once from "not checked in" to
//! "checked in" and never back. The gate's own existence check is only a
//! fast path; the store's uniqueness constraint is what makes the rule hold
//! under concurrent submissions.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  Error, Result,
  clock::CivilClock,
  employee::EmployeeId,
  evidence::{Evidence, EvidencePolicy, EvidenceRejection},
  record::{AttendanceRecord, NewRecord, PhotoRef, has_record_on},
  store::{AppendOutcome, RecordStore},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Why a check-in was not admitted. These are expected outcomes reported to
/// the employee, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
  #[error(transparent)]
  Evidence(EvidenceRejection),
  #[error("you have already checked in today")]
  AlreadyCheckedInToday,
}

impl Rejection {
  /// Stable machine-readable code, e.g. `"too_large"` or
  /// `"already_checked_in_today"`.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Evidence(r) => r.code(),
      Self::AlreadyCheckedInToday => "already_checked_in_today",
    }
  }
}

impl From<EvidenceRejection> for Rejection {
  fn from(r: EvidenceRejection) -> Self { Self::Evidence(r) }
}

#[derive(Debug, Clone)]
pub enum CheckInOutcome {
  Accepted(AttendanceRecord),
  Rejected(Rejection),
}

impl CheckInOutcome {
  pub fn is_accepted(&self) -> bool { matches!(self, Self::Accepted(_)) }

  pub fn record(&self) -> Option<&AttendanceRecord> {
    match self {
      Self::Accepted(r) => Some(r),
      Self::Rejected(_) => None,
    }
  }

  pub fn rejection(&self) -> Option<Rejection> {
    match self {
      Self::Accepted(_) => None,
      Self::Rejected(r) => Some(*r),
    }
  }
}

// ─── Gate ────────────────────────────────────────────────────────────────────

/// Decides whether a check-in attempt is admitted, and records it if so.
#[derive(Debug)]
pub struct CheckInGate<S> {
  store:  Arc<S>,
  clock:  CivilClock,
  policy: EvidencePolicy,
}

impl<S: RecordStore> CheckInGate<S> {
  pub fn new(store: Arc<S>, clock: CivilClock, policy: EvidencePolicy) -> Self {
    Self { store, clock, policy }
  }

  /// Attempt a check-in for `employee_id` with the submitted evidence.
  ///
  /// The record's timestamp is always the gate's own `now()`. Store
  /// failures are returned as [`Error::StoreUnavailable`] and are not
  /// retried.
  pub async fn attempt_check_in(
    &self,
    employee_id: &EmployeeId,
    evidence: Option<Evidence>,
  ) -> Result<CheckInOutcome> {
    let evidence = match self.policy.validate(evidence) {
      Ok(e) => e,
      Err(reason) => {
        debug!(%employee_id, code = reason.code(), "evidence rejected");
        return Ok(CheckInOutcome::Rejected(reason.into()));
      }
    };

    let now = self.clock.now();
    let day = self.clock.day_key(now);

    let existing = self
      .store
      .records_for(employee_id)
      .await
      .map_err(|e| self.store_failure(employee_id, e))?;
    if has_record_on(&self.clock, &existing, day) {
      info!(%employee_id, %day, "check-in refused: already checked in");
      return Ok(CheckInOutcome::Rejected(Rejection::AlreadyCheckedInToday));
    }

    let employee = self
      .store
      .get_employee(employee_id)
      .await
      .map_err(|e| self.store_failure(employee_id, e))?
      .ok_or_else(|| Error::UnknownEmployee(employee_id.clone()))?;

    let photo_ref = self
      .store
      .put_evidence(employee_id, evidence)
      .await
      .map_err(|e| self.store_failure(employee_id, e))?;

    let input = NewRecord {
      employee_id: employee.employee_id,
      full_name:   employee.full_name,
      timestamp:   now,
      day_key:     day,
      photo_ref:   photo_ref.clone(),
    };

    match self.store.append_record(input).await {
      Ok(AppendOutcome::Appended(record)) => {
        info!(%employee_id, %day, record_id = %record.id, "check-in accepted");
        Ok(CheckInOutcome::Accepted(record))
      }
      Ok(AppendOutcome::DuplicateDay) => {
        warn!(%employee_id, %day, "concurrent check-in already recorded for this day");
        self.discard(&photo_ref).await;
        Ok(CheckInOutcome::Rejected(Rejection::AlreadyCheckedInToday))
      }
      Err(e) => {
        let err = self.store_failure(employee_id, e);
        self.discard(&photo_ref).await;
        Err(err)
      }
    }
  }

  async fn discard(&self, photo_ref: &PhotoRef) {
    if let Err(e) = self.store.discard_evidence(photo_ref).await {
      warn!(%photo_ref, error = %e, "failed to discard unreferenced evidence");
    }
  }

  fn store_failure(&self, employee_id: &EmployeeId, e: S::Error) -> Error {
    error!(%employee_id, error = %e, "record store failure during check-in");
    Error::store(e)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};

  use super::*;
  use crate::{
    clock::{DEFAULT_UTC_OFFSET_MINUTES, ManualClock},
    employee::Role,
    memory::MemoryStore,
  };

  const MIB: usize = 1024 * 1024;

  fn wib(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
      .unwrap()
      .with_ymd_and_hms(y, mo, d, h, mi, 0)
      .unwrap()
      .with_timezone(&Utc)
  }

  fn png(len: usize) -> Option<Evidence> {
    Some(Evidence::new("image/png", vec![7u8; len]))
  }

  struct Fixture {
    store:  Arc<MemoryStore>,
    manual: Arc<ManualClock>,
    gate:   Arc<CheckInGate<MemoryStore>>,
  }

  fn fixture(at: DateTime<Utc>) -> Fixture {
    let store = Arc::new(MemoryStore::default());
    store.add_employee("E1", "Alice", Role::Employee);
    store.add_employee("E2", "Bob", Role::Employee);
    let manual = Arc::new(ManualClock::new(at));
    let clock =
      CivilClock::from_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES, manual.clone()).unwrap();
    let gate = Arc::new(CheckInGate::new(store.clone(), clock, EvidencePolicy::default()));
    Fixture { store, manual, gate }
  }

  #[tokio::test]
  async fn accepts_first_check_in_with_server_timestamp() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    let outcome = f.gate.attempt_check_in(&"E1".into(), png(MIB)).await.unwrap();

    let record = outcome.record().unwrap();
    assert_eq!(record.employee_id.as_str(), "E1");
    assert_eq!(record.full_name, "Alice");
    assert_eq!(record.timestamp, wib(2025, 3, 1, 8, 0));
    assert_eq!(f.store.evidence_count(), 1);
  }

  #[tokio::test]
  async fn second_attempt_same_day_is_rejected() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    let employee = EmployeeId::new("E1");
    assert!(f.gate.attempt_check_in(&employee, png(MIB)).await.unwrap().is_accepted());

    f.manual.advance(TimeDelta::hours(15));
    let outcome = f.gate.attempt_check_in(&employee, png(MIB)).await.unwrap();
    assert_eq!(outcome.rejection(), Some(Rejection::AlreadyCheckedInToday));
    assert_eq!(f.store.record_count(), 1);
  }

  #[tokio::test]
  async fn next_civil_day_is_admitted() {
    let f = fixture(wib(2025, 3, 1, 23, 59));
    let employee = EmployeeId::new("E1");
    assert!(f.gate.attempt_check_in(&employee, png(MIB)).await.unwrap().is_accepted());

    f.manual.advance(TimeDelta::minutes(1));
    assert!(f.gate.attempt_check_in(&employee, png(MIB)).await.unwrap().is_accepted());
    assert_eq!(f.store.record_count(), 2);
  }

  #[tokio::test]
  async fn other_employees_are_independent() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    assert!(f.gate.attempt_check_in(&"E1".into(), png(MIB)).await.unwrap().is_accepted());
    assert!(f.gate.attempt_check_in(&"E2".into(), png(MIB)).await.unwrap().is_accepted());
  }

  #[tokio::test]
  async fn evidence_rejection_stores_nothing() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    let outcome = f
      .gate
      .attempt_check_in(&"E1".into(), Some(Evidence::new("image/gif", vec![1u8; 10])))
      .await
      .unwrap();
    assert_eq!(
      outcome.rejection(),
      Some(Rejection::Evidence(EvidenceRejection::UnsupportedFormat))
    );

    let outcome = f.gate.attempt_check_in(&"E1".into(), None).await.unwrap();
    assert_eq!(outcome.rejection(), Some(Rejection::Evidence(EvidenceRejection::Missing)));

    let outcome = f.gate.attempt_check_in(&"E1".into(), png(6 * MIB)).await.unwrap();
    assert_eq!(outcome.rejection(), Some(Rejection::Evidence(EvidenceRejection::TooLarge)));

    assert_eq!(f.store.record_count(), 0);
    assert_eq!(f.store.evidence_count(), 0);
  }

  #[tokio::test]
  async fn unknown_employee_is_an_error() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    let err = f.gate.attempt_check_in(&"E9".into(), png(MIB)).await.unwrap_err();
    assert!(matches!(err, Error::UnknownEmployee(id) if id.as_str() == "E9"));
    assert_eq!(f.store.evidence_count(), 0);
  }

  #[tokio::test]
  async fn store_failure_is_propagated_as_retryable() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    f.store.set_failing(true);
    let err = f.gate.attempt_check_in(&"E1".into(), png(MIB)).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(err.is_retryable());
  }

  #[tokio::test]
  async fn lost_race_maps_to_already_checked_in_and_discards_evidence() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    let employee = EmployeeId::new("E1");
    assert!(f.gate.attempt_check_in(&employee, png(MIB)).await.unwrap().is_accepted());

    // Simulate a submission whose existence check ran before the first
    // insert became visible.
    f.store.set_stale_reads(true);
    let outcome = f.gate.attempt_check_in(&employee, png(MIB)).await.unwrap();
    assert_eq!(outcome.rejection(), Some(Rejection::AlreadyCheckedInToday));
    assert_eq!(f.store.record_count(), 1);
    assert_eq!(f.store.evidence_count(), 1);
  }

  #[tokio::test]
  async fn concurrent_attempts_admit_exactly_one() {
    let f = fixture(wib(2025, 3, 1, 8, 0));
    let mut handles = Vec::new();
    for _ in 0..8 {
      let gate = f.gate.clone();
      handles.push(tokio::spawn(async move {
        gate.attempt_check_in(&"E1".into(), png(1024)).await.unwrap()
      }));
    }

    let mut accepted = 0;
    let mut duplicates = 0;
    for h in handles {
      match h.await.unwrap() {
        CheckInOutcome::Accepted(_) => accepted += 1,
        CheckInOutcome::Rejected(Rejection::AlreadyCheckedInToday) => duplicates += 1,
        other => panic!("unexpected outcome: {other:?}"),
      }
    }
    assert_eq!(accepted, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(f.store.record_count(), 1);
  }

  #[test]
  fn rejection_codes() {
    assert_eq!(Rejection::AlreadyCheckedInToday.code(), "already_checked_in_today");
    assert_eq!(Rejection::from(EvidenceRejection::TooLarge).code(), "too_large");
  }
}
