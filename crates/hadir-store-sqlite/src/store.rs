//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};
use uuid::Uuid;

use hadir_core::{
  employee::{Employee, EmployeeId},
  evidence::ValidEvidence,
  record::{AttendanceRecord, NewRecord, PhotoRef, StoredEvidence},
  store::{AppendOutcome, RecordStore},
};

use crate::{
  Result,
  encode::{
    RawEmployee, RawEvidence, RawRecord, content_hash, encode_dt, encode_uuid,
    new_photo_ref,
  },
  schema::SCHEMA,
};

const RECORD_COLUMNS: &str =
  "record_id, employee_id, full_name, recorded_at, photo_ref";

fn raw_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
  Ok(RawRecord {
    record_id:   row.get(0)?,
    employee_id: row.get(1)?,
    full_name:   row.get(2)?,
    recorded_at: row.get(3)?,
    photo_ref:   row.get(4)?,
  })
}

fn raw_employee(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEmployee> {
  Ok(RawEmployee {
    employee_id: row.get(0)?,
    full_name:   row.get(1)?,
    status:      row.get(2)?,
    role:        row.get(3)?,
  })
}

/// Whether `err` is a violation of a `UNIQUE` constraint (as opposed to a
/// primary-key or foreign-key violation).
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendance store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    info!(path = %path.display(), "attendance store opened");
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Employee directory ────────────────────────────────────────────────────

  /// Insert or replace a directory entry. The directory is owned by employee
  /// management; this exists so the server can be seeded.
  pub async fn upsert_employee(&self, employee: &Employee) -> Result<()> {
    let id_str     = employee.employee_id.as_str().to_owned();
    let name       = employee.full_name.clone();
    let status_str = employee.status.to_string();
    let role_str   = employee.role.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (employee_id, full_name, status, role)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(employee_id) DO UPDATE SET
             full_name = excluded.full_name,
             status    = excluded.status,
             role      = excluded.role",
          rusqlite::params![id_str, name, status_str, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Every directory entry, ordered by employee ID.
  pub async fn list_employees(&self) -> Result<Vec<Employee>> {
    let raws: Vec<RawEmployee> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT employee_id, full_name, status, role
           FROM employees ORDER BY employee_id",
        )?;
        let rows = stmt
          .query_map([], raw_employee)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_employee).collect()
  }

  #[cfg(test)]
  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
        })
        .await?,
    )
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn get_employee(&self, employee_id: &EmployeeId) -> Result<Option<Employee>> {
    let id_str = employee_id.as_str().to_owned();

    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT employee_id, full_name, status, role
               FROM employees WHERE employee_id = ?1",
              rusqlite::params![id_str],
              raw_employee,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn put_evidence(&self, owner: &EmployeeId, evidence: ValidEvidence) -> Result<PhotoRef> {
    let format    = evidence.format();
    let photo_ref = new_photo_ref(format);

    let ref_str    = photo_ref.as_str().to_owned();
    let owner_str  = owner.as_str().to_owned();
    let media_type = format.media_type();
    let file_name  = evidence.file_name().map(str::to_owned);
    let hash       = content_hash(evidence.bytes());
    let byte_len   = evidence.bytes().len() as i64;
    let at_str     = encode_dt(Utc::now());
    let data       = evidence.bytes().to_vec();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO evidence
             (photo_ref, owner_id, media_type, file_name,
              content_hash, byte_len, stored_at, data)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            ref_str, owner_str, media_type, file_name, hash, byte_len, at_str, data
          ],
        )?;
        Ok(())
      })
      .await?;

    debug!(%owner, %photo_ref, bytes = byte_len, "evidence stored");
    Ok(photo_ref)
  }

  async fn load_evidence(&self, photo_ref: &PhotoRef) -> Result<Option<StoredEvidence>> {
    let ref_str = photo_ref.as_str().to_owned();

    let raw: Option<RawEvidence> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT photo_ref, owner_id, media_type, file_name,
                      content_hash, stored_at, data
               FROM evidence WHERE photo_ref = ?1",
              rusqlite::params![ref_str],
              |row| {
                Ok(RawEvidence {
                  photo_ref:    row.get(0)?,
                  owner_id:     row.get(1)?,
                  media_type:   row.get(2)?,
                  file_name:    row.get(3)?,
                  content_hash: row.get(4)?,
                  stored_at:    row.get(5)?,
                  data:         row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvidence::into_stored).transpose()
  }

  async fn discard_evidence(&self, photo_ref: &PhotoRef) -> Result<()> {
    let ref_str = photo_ref.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM evidence
           WHERE photo_ref = ?1
             AND NOT EXISTS (SELECT 1 FROM attendance WHERE photo_ref = ?1)",
          rusqlite::params![ref_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_record(&self, input: NewRecord) -> Result<AppendOutcome> {
    let record = AttendanceRecord {
      id:          Uuid::new_v4(),
      employee_id: input.employee_id,
      full_name:   input.full_name,
      timestamp:   input.timestamp,
      photo_ref:   input.photo_ref,
    };

    let id_str       = encode_uuid(record.id);
    let employee_str = record.employee_id.as_str().to_owned();
    let name         = record.full_name.clone();
    let at_str       = encode_dt(record.timestamp);
    let day_str      = input.day_key.to_string();
    let ref_str      = record.photo_ref.as_str().to_owned();

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO attendance
             (record_id, employee_id, full_name, recorded_at, day_key, photo_ref)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, employee_str, name, at_str, day_str, ref_str],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if inserted {
      Ok(AppendOutcome::Appended(record))
    } else {
      Ok(AppendOutcome::DuplicateDay)
    }
  }

  async fn records_for(&self, employee_id: &EmployeeId) -> Result<Vec<AttendanceRecord>> {
    let id_str = employee_id.as_str().to_owned();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM attendance
           WHERE employee_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], raw_record)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn all_records(&self) -> Result<Vec<AttendanceRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM attendance ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map([], raw_record)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}
