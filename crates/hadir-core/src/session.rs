//! The session boundary: who is calling, and with which role.
//!
//! Authentication happens upstream. A [`SessionProvider`] only turns an
//! already-verified credential into an [`Actor`]; the engine trusts the
//! result and passes it explicitly into each operation.

use std::{future::Future, sync::Arc};

use crate::{
  employee::{Actor, EmployeeId},
  store::RecordStore,
};

pub trait SessionProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve the actor behind `credential`. `None` means no session.
  fn current_actor<'a>(
    &'a self,
    credential: &'a str,
  ) -> impl Future<Output = Result<Option<Actor>, Self::Error>> + Send + 'a;
}

/// Treats the credential as an employee ID asserted by a trusted gateway and
/// resolves the role from the store's employee directory.
#[derive(Debug)]
pub struct DirectorySession<S> {
  store: Arc<S>,
}

impl<S> DirectorySession<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S> Clone for DirectorySession<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: RecordStore> SessionProvider for DirectorySession<S> {
  type Error = S::Error;

  async fn current_actor(&self, credential: &str) -> Result<Option<Actor>, S::Error> {
    let credential = credential.trim();
    if credential.is_empty() {
      return Ok(None);
    }
    let employee = self.store.get_employee(&EmployeeId::new(credential)).await?;
    Ok(employee.as_ref().map(Actor::from))
  }
}
