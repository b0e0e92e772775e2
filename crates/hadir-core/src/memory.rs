//! In-process [`RecordStore`] used by the engine's own unit tests.

use std::sync::{
  Mutex, PoisonError,
  atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  clock::DayKey,
  employee::{Employee, EmployeeId, EmployeeStatus, Role},
  evidence::ValidEvidence,
  record::{AttendanceRecord, NewRecord, PhotoRef, StoredEvidence},
  store::{AppendOutcome, RecordStore},
};

#[derive(Debug, Error)]
#[error("memory store is offline")]
pub struct Offline;

#[derive(Default)]
struct Inner {
  employees: Vec<Employee>,
  records:   Vec<(DayKey, AttendanceRecord)>,
  evidence:  Vec<StoredEvidence>,
}

#[derive(Default)]
pub struct MemoryStore {
  inner:       Mutex<Inner>,
  failing:     AtomicBool,
  stale_reads: AtomicBool,
}

impl MemoryStore {
  pub fn add_employee(&self, id: &str, name: &str, role: Role) {
    self.lock().employees.push(Employee {
      employee_id: EmployeeId::new(id),
      full_name: name.to_owned(),
      status: EmployeeStatus::Active,
      role,
    });
  }

  /// Append a record directly, bypassing the gate.
  pub fn insert(&self, record: AttendanceRecord, day: DayKey) {
    self.lock().records.push((day, record));
  }

  /// Make every call fail with [`Offline`].
  pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

  /// Make `records_for` return nothing, as if reading a stale replica.
  pub fn set_stale_reads(&self, stale: bool) { self.stale_reads.store(stale, Ordering::SeqCst); }

  pub fn record_count(&self) -> usize { self.lock().records.len() }

  pub fn evidence_count(&self) -> usize { self.lock().evidence.len() }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn check(&self) -> Result<(), Offline> {
    if self.failing.load(Ordering::SeqCst) { Err(Offline) } else { Ok(()) }
  }
}

impl RecordStore for MemoryStore {
  type Error = Offline;

  async fn get_employee(&self, employee_id: &EmployeeId) -> Result<Option<Employee>, Offline> {
    self.check()?;
    Ok(self.lock().employees.iter().find(|e| &e.employee_id == employee_id).cloned())
  }

  async fn put_evidence(
    &self,
    owner: &EmployeeId,
    evidence: ValidEvidence,
  ) -> Result<PhotoRef, Offline> {
    self.check()?;
    let extension = evidence.format().extension();
    let photo_ref = PhotoRef::new(format!("photos/{}.{extension}", Uuid::new_v4()));
    self.lock().evidence.push(StoredEvidence {
      photo_ref: photo_ref.clone(),
      owner: owner.clone(),
      format: evidence.format(),
      file_name: evidence.file_name().map(str::to_owned),
      content_hash: String::new(),
      stored_at: Utc::now(),
      bytes: evidence.bytes().clone(),
    });
    Ok(photo_ref)
  }

  async fn load_evidence(&self, photo_ref: &PhotoRef) -> Result<Option<StoredEvidence>, Offline> {
    self.check()?;
    Ok(self.lock().evidence.iter().find(|e| &e.photo_ref == photo_ref).cloned())
  }

  async fn discard_evidence(&self, photo_ref: &PhotoRef) -> Result<(), Offline> {
    self.check()?;
    let mut inner = self.lock();
    if !inner.records.iter().any(|(_, r)| &r.photo_ref == photo_ref) {
      inner.evidence.retain(|e| &e.photo_ref != photo_ref);
    }
    Ok(())
  }

  async fn append_record(&self, input: NewRecord) -> Result<AppendOutcome, Offline> {
    self.check()?;
    let mut inner = self.lock();
    let taken = inner
      .records
      .iter()
      .any(|(day, r)| *day == input.day_key && r.employee_id == input.employee_id);
    if taken {
      return Ok(AppendOutcome::DuplicateDay);
    }
    let record = AttendanceRecord {
      id:          Uuid::new_v4(),
      employee_id: input.employee_id,
      full_name:   input.full_name,
      timestamp:   input.timestamp,
      photo_ref:   input.photo_ref,
    };
    inner.records.push((input.day_key, record.clone()));
    Ok(AppendOutcome::Appended(record))
  }

  async fn records_for(&self, employee_id: &EmployeeId) -> Result<Vec<AttendanceRecord>, Offline> {
    self.check()?;
    if self.stale_reads.load(Ordering::SeqCst) {
      return Ok(Vec::new());
    }
    Ok(
      self
        .lock()
        .records
        .iter()
        .filter(|(_, r)| &r.employee_id == employee_id)
        .map(|(_, r)| r.clone())
        .collect(),
    )
  }

  async fn all_records(&self) -> Result<Vec<AttendanceRecord>, Offline> {
    self.check()?;
    Ok(self.lock().records.iter().map(|(_, r)| r.clone()).collect())
  }
}
