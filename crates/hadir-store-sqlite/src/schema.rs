//! SQL schema for the Hadir SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Mirror of the employee directory. Owned by employee management; the
-- attendance engine only reads it.
CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'active',   -- 'active' | 'inactive'
    role        TEXT NOT NULL DEFAULT 'employee'  -- 'employee' | 'hr'
);

-- One row per validated upload.
CREATE TABLE IF NOT EXISTS evidence (
    photo_ref    TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL REFERENCES employees(employee_id),
    media_type   TEXT NOT NULL,
    file_name    TEXT,            -- as supplied by the client; may be NULL
    content_hash TEXT NOT NULL,   -- SHA-256 hex of data
    byte_len     INTEGER NOT NULL,
    stored_at    TEXT NOT NULL,   -- RFC 3339 UTC
    data         BLOB NOT NULL
);

-- Attendance records are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS attendance (
    record_id   TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL REFERENCES employees(employee_id),
    full_name   TEXT NOT NULL,
    recorded_at TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    day_key     TEXT NOT NULL,   -- YYYY-MM-DD in the civil offset
    photo_ref   TEXT NOT NULL REFERENCES evidence(photo_ref),
    UNIQUE (employee_id, day_key)
);

CREATE INDEX IF NOT EXISTS attendance_employee_idx ON attendance(employee_id);
CREATE INDEX IF NOT EXISTS attendance_day_idx      ON attendance(day_key);

PRAGMA user_version = 1;
";
