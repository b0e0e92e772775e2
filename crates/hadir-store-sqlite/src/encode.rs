//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! enums their snake_case names.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use hadir_core::{
  employee::{Employee, EmployeeId, EmployeeStatus, Role},
  evidence::ImageFormat,
  record::{AttendanceRecord, PhotoRef, StoredEvidence},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Decode { column: "role", value: s.to_owned() })
}

pub fn decode_status(s: &str) -> Result<EmployeeStatus> {
  s.parse().map_err(|_| Error::Decode { column: "status", value: s.to_owned() })
}

pub fn decode_format(s: &str) -> Result<ImageFormat> {
  ImageFormat::from_media_type(s).ok_or_else(|| Error::Decode {
    column: "media_type",
    value:  s.to_owned(),
  })
}

// ─── Evidence ────────────────────────────────────────────────────────────────

/// SHA-256 hex digest of an evidence payload.
pub fn content_hash(data: &[u8]) -> String { hex::encode(Sha256::digest(data)) }

/// A fresh, unguessable reference such as `photos/3f2a….png`.
pub fn new_photo_ref(format: ImageFormat) -> PhotoRef {
  PhotoRef::new(format!("photos/{}.{}", Uuid::new_v4().simple(), format.extension()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `attendance` row.
pub struct RawRecord {
  pub record_id:   String,
  pub employee_id: String,
  pub full_name:   String,
  pub recorded_at: String,
  pub photo_ref:   String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      id:          decode_uuid(&self.record_id)?,
      employee_id: EmployeeId::new(self.employee_id),
      full_name:   self.full_name,
      timestamp:   decode_dt(&self.recorded_at)?,
      photo_ref:   PhotoRef::new(self.photo_ref),
    })
  }
}

/// Raw values read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id: String,
  pub full_name:   String,
  pub status:      String,
  pub role:        String,
}

impl RawEmployee {
  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id: EmployeeId::new(self.employee_id),
      full_name:   self.full_name,
      status:      decode_status(&self.status)?,
      role:        decode_role(&self.role)?,
    })
  }
}

/// Raw values read directly from an `evidence` row.
pub struct RawEvidence {
  pub photo_ref:    String,
  pub owner_id:     String,
  pub media_type:   String,
  pub file_name:    Option<String>,
  pub content_hash: String,
  pub stored_at:    String,
  pub data:         Vec<u8>,
}

impl RawEvidence {
  pub fn into_stored(self) -> Result<StoredEvidence> {
    Ok(StoredEvidence {
      photo_ref:    PhotoRef::new(self.photo_ref),
      owner:        EmployeeId::new(self.owner_id),
      format:       decode_format(&self.media_type)?,
      file_name:    self.file_name,
      content_hash: self.content_hash,
      stored_at:    decode_dt(&self.stored_at)?,
      bytes:        Bytes::from(self.data),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn content_hash_is_sha256_hex() {
    assert_eq!(
      content_hash(b""),
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }

  #[test]
  fn photo_refs_carry_the_format_extension() {
    let r = new_photo_ref(ImageFormat::Png);
    assert!(r.as_str().starts_with("photos/"));
    assert!(r.as_str().ends_with(".png"));
    assert_ne!(new_photo_ref(ImageFormat::Jpeg), new_photo_ref(ImageFormat::Jpeg));
  }

  #[test]
  fn unknown_role_is_a_decode_error() {
    assert!(matches!(decode_role("boss"), Err(Error::Decode { column: "role", .. })));
    assert_eq!(decode_role("hr").unwrap(), Role::Hr);
  }
}
