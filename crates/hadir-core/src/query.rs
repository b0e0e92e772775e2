//! Read views over the attendance log.
//!
//! Views are recomputed on every call from a fresh store read; there is no
//! caching and no live subscription. Callers that want fresh data simply
//! call again.

use std::sync::Arc;

use tracing::debug;

use crate::{
  Error, Result,
  clock::{CivilClock, DayKey},
  employee::{Actor, EmployeeId},
  record::{AttendanceRecord, PhotoRef, StoredEvidence, has_record_on, sort_newest_first},
  store::RecordStore,
};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Restrictions for [`RecordQuery::all_records`]. An absent field places no
/// restriction on that dimension; present fields combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
  /// Case-insensitive substring matched against the employee ID or the full
  /// name. An empty string matches everything.
  pub search_term: Option<String>,
  /// Civil day the record must fall on.
  pub date:        Option<DayKey>,
}

impl RecordFilter {
  pub fn search(mut self, term: impl Into<String>) -> Self {
    self.search_term = Some(term.into());
    self
  }

  pub fn on(mut self, day: DayKey) -> Self {
    self.date = Some(day);
    self
  }

  pub fn matches(&self, clock: &CivilClock, record: &AttendanceRecord) -> bool {
    if let Some(term) = self.search_term.as_deref().filter(|t| !t.is_empty()) {
      let needle = term.to_lowercase();
      let hit = record.employee_id.as_str().to_lowercase().contains(&needle)
        || record.full_name.to_lowercase().contains(&needle);
      if !hit {
        return false;
      }
    }
    if let Some(day) = self.date
      && clock.day_key(record.timestamp) != day
    {
      return false;
    }
    true
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Sorted, filtered retrieval over the record log. Never writes.
#[derive(Debug)]
pub struct RecordQuery<S> {
  store: Arc<S>,
  clock: CivilClock,
}

impl<S: RecordStore> RecordQuery<S> {
  pub fn new(store: Arc<S>, clock: CivilClock) -> Self { Self { store, clock } }

  pub fn clock(&self) -> &CivilClock { &self.clock }

  /// The employee's own records, newest first. An employee with no
  /// check-ins yet gets an empty list.
  pub async fn my_history(&self, employee_id: &EmployeeId) -> Result<Vec<AttendanceRecord>> {
    let mut records = self.store.records_for(employee_id).await.map_err(Error::store)?;
    sort_newest_first(&mut records);
    Ok(records)
  }

  /// Whether the employee already has a record on today's civil day.
  pub async fn has_record_today(&self, employee_id: &EmployeeId) -> Result<bool> {
    self.has_record_on(employee_id, self.clock.today()).await
  }

  /// Whether the employee has a record on the civil day `day`. Callers that
  /// report `day` alongside the answer read the clock once and pass it here.
  pub async fn has_record_on(&self, employee_id: &EmployeeId, day: DayKey) -> Result<bool> {
    let history = self.my_history(employee_id).await?;
    Ok(has_record_on(&self.clock, &history, day))
  }

  /// Every employee's records matching `filter`, newest first. HR only; the
  /// role check happens before the store is touched.
  pub async fn all_records(
    &self,
    actor: &Actor,
    filter: &RecordFilter,
  ) -> Result<Vec<AttendanceRecord>> {
    if !actor.is_hr() {
      return Err(Error::Unauthorized(actor.employee_id.clone()));
    }

    let mut records = self.store.all_records().await.map_err(Error::store)?;
    records.retain(|r| filter.matches(&self.clock, r));
    sort_newest_first(&mut records);

    debug!(
      actor = %actor.employee_id,
      matched = records.len(),
      "all-records view computed"
    );
    Ok(records)
  }

  /// Evidence behind a record. Visible to its owner and to HR.
  pub async fn evidence(
    &self,
    actor: &Actor,
    photo_ref: &PhotoRef,
  ) -> Result<Option<StoredEvidence>> {
    let Some(evidence) = self.store.load_evidence(photo_ref).await.map_err(Error::store)? else {
      return Ok(None);
    };
    if evidence.owner != actor.employee_id && !actor.is_hr() {
      return Err(Error::Unauthorized(actor.employee_id.clone()));
    }
    Ok(Some(evidence))
  }
}
