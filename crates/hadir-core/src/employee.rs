//! Employee identity as seen by the attendance engine.
//!
//! Employees are owned by the employee-management system. The engine only
//! reads the ID, display name and role; it never creates or edits profiles.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The organisation-assigned employee identifier (e.g. `"E1"`).
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EmployeeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for EmployeeId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// Access role. Only [`Role::Hr`] may read the all-employees view.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
  #[default]
  Employee,
  Hr,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EmployeeStatus {
  #[default]
  Active,
  Inactive,
}

/// A directory entry for an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id: EmployeeId,
  pub full_name:   String,
  pub status:      EmployeeStatus,
  pub role:        Role,
}

/// The already-authenticated caller of an operation, as supplied by a
/// [`crate::session::SessionProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub employee_id: EmployeeId,
  pub role:        Role,
}

impl Actor {
  pub fn is_hr(&self) -> bool { self.role == Role::Hr }
}

impl From<&Employee> for Actor {
  fn from(e: &Employee) -> Self {
    Self { employee_id: e.employee_id.clone(), role: e.role }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parses_case_insensitively() {
    assert_eq!("HR".parse::<Role>().unwrap(), Role::Hr);
    assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
    assert!("manager".parse::<Role>().is_err());
  }

  #[test]
  fn role_round_trips_through_display() {
    assert_eq!(Role::Hr.to_string(), "hr");
    assert_eq!(EmployeeStatus::Inactive.to_string(), "inactive");
  }

  #[test]
  fn employee_id_serialises_as_plain_string() {
    let json = serde_json::to_string(&EmployeeId::new("E1")).unwrap();
    assert_eq!(json, "\"E1\"");
  }
}
