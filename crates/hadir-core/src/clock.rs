//! Civil clock: maps absolute instants to calendar days in a fixed offset.
//!
//! Attendance days are civil days in the organisation's timezone (WIB,
//! `+07:00`), never in the host's local zone. The offset is fixed; a zone
//! with daylight-saving transitions would need a tz database here instead.

use std::{
  fmt,
  str::FromStr,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// The default civil offset, `+07:00`, in minutes east of UTC.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

// ─── DayKey ──────────────────────────────────────────────────────────────────

/// A civil calendar day, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
  pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(year, month, day).map(Self)
  }
}

impl fmt::Display for DayKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format("%Y-%m-%d"))
  }
}

impl FromStr for DayKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    // chrono accepts unpadded fields; day keys are always zero-padded.
    if s.len() != 10 {
      return Err(Error::InvalidDayKey(s.to_owned()));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .map(Self)
      .map_err(|_| Error::InvalidDayKey(s.to_owned()))
  }
}

impl Serialize for DayKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for DayKey {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

// ─── Clock sources ───────────────────────────────────────────────────────────

/// Source of the current instant.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Reads the host's system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(at: DateTime<Utc>) -> Self { Self { now: Mutex::new(at) } }

  pub fn set(&self, at: DateTime<Utc>) {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
  }

  pub fn advance(&self, by: TimeDelta) {
    let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

// ─── CivilClock ──────────────────────────────────────────────────────────────

/// Combines a [`Clock`] source with the organisation's fixed civil offset.
///
/// Cloning is cheap; the source is reference-counted.
#[derive(Clone)]
pub struct CivilClock {
  offset: FixedOffset,
  source: Arc<dyn Clock>,
}

impl CivilClock {
  pub fn new(offset: FixedOffset, source: Arc<dyn Clock>) -> Self {
    Self { offset, source }
  }

  /// Build from an offset in minutes east of UTC. Returns `None` when the
  /// offset is out of range (beyond ±24h).
  pub fn from_offset_minutes(minutes: i32, source: Arc<dyn Clock>) -> Option<Self> {
    let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
    Some(Self::new(offset, source))
  }

  /// System time at the default `+07:00` offset.
  pub fn system() -> Self { Self::new(default_offset(), Arc::new(SystemClock)) }

  pub fn offset(&self) -> FixedOffset { self.offset }

  pub fn now(&self) -> DateTime<Utc> { self.source.now() }

  /// The wall-clock reading of `instant` in the civil offset.
  pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&self.offset)
  }

  pub fn day_key(&self, instant: DateTime<Utc>) -> DayKey {
    DayKey(self.local(instant).date_naive())
  }

  pub fn today(&self) -> DayKey { self.day_key(self.now()) }
}

impl fmt::Debug for CivilClock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CivilClock")
      .field("offset", &self.offset)
      .finish_non_exhaustive()
  }
}

fn default_offset() -> FixedOffset {
  FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
    .expect("+07:00 is within the valid offset range")
}
