//! Attendance records: the append-only log of accepted check-ins.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  clock::{CivilClock, DayKey},
  employee::EmployeeId,
  evidence::ImageFormat,
};

// ─── Evidence references ─────────────────────────────────────────────────────

/// Opaque reference to stored evidence, e.g. `photos/<uuid>.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
  pub fn new(reference: impl Into<String>) -> Self { Self(reference.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PhotoRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Evidence read back from the store.
#[derive(Debug, Clone)]
pub struct StoredEvidence {
  pub photo_ref:    PhotoRef,
  /// The employee whose submission produced this evidence.
  pub owner:        EmployeeId,
  pub format:       ImageFormat,
  /// File name the client gave the upload, if any.
  pub file_name:    Option<String>,
  /// SHA-256 hex digest of `bytes`.
  pub content_hash: String,
  pub stored_at:    DateTime<Utc>,
  pub bytes:        Bytes,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One accepted check-in. Never updated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub id:          Uuid,
  pub employee_id: EmployeeId,
  /// Display name as it was when the check-in was accepted.
  pub full_name:   String,
  /// Server-observed acceptance instant.
  pub timestamp:   DateTime<Utc>,
  pub photo_ref:   PhotoRef,
}

/// Input to [`crate::store::RecordStore::append_record`].
///
/// `day_key` is computed by the check-in gate from `timestamp`; the store
/// persists it verbatim and enforces `(employee_id, day_key)` uniqueness.
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub employee_id: EmployeeId,
  pub full_name:   String,
  pub timestamp:   DateTime<Utc>,
  pub day_key:     DayKey,
  pub photo_ref:   PhotoRef,
}

/// Whether any of `records` falls on civil day `day`.
///
/// This is the single definition of "already checked in" shared by the gate
/// and the query engine.
pub fn has_record_on(
  clock: &CivilClock,
  records: &[AttendanceRecord],
  day: DayKey,
) -> bool {
  records.iter().any(|r| clock.day_key(r.timestamp) == day)
}

/// Sort newest first. The sort is stable, so records with identical
/// timestamps keep their storage order.
pub fn sort_newest_first(records: &mut [AttendanceRecord]) {
  records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn record(id: u128, employee: &str, timestamp: DateTime<Utc>) -> AttendanceRecord {
    AttendanceRecord {
      id:          Uuid::from_u128(id),
      employee_id: EmployeeId::new(employee),
      full_name:   employee.to_owned(),
      timestamp,
      photo_ref:   PhotoRef::new(format!("photos/{id}.png")),
    }
  }

  #[test]
  fn has_record_on_uses_civil_days() {
    let clock = CivilClock::system();
    // 18:00 UTC on 9 Jan is 01:00 WIB on 10 Jan.
    let records = vec![record(1, "E1", Utc.with_ymd_and_hms(2025, 1, 9, 18, 0, 0).unwrap())];

    assert!(has_record_on(&clock, &records, DayKey::from_ymd(2025, 1, 10).unwrap()));
    assert!(!has_record_on(&clock, &records, DayKey::from_ymd(2025, 1, 9).unwrap()));
    assert!(!has_record_on(&clock, &[], DayKey::from_ymd(2025, 1, 10).unwrap()));
  }

  #[test]
  fn newest_first_keeps_storage_order_on_ties() {
    let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 1, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 1, 11, 1, 0, 0).unwrap();
    let mut records = vec![
      record(1, "E1", t0),
      record(2, "E2", t1),
      record(3, "E3", t1),
      record(4, "E4", t0),
    ];
    sort_newest_first(&mut records);

    let ids: Vec<u128> = records.iter().map(|r| r.id.as_u128()).collect();
    assert_eq!(ids, vec![2, 3, 1, 4]);
  }

  #[test]
  fn record_timestamp_serialises_as_utc_instant() {
    let r = record(1, "E1", Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).unwrap());
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["timestamp"], "2025-03-01T01:00:00Z");
    assert_eq!(json["employee_id"], "E1");
  }
}
