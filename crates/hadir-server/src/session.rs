//! Resolves the calling employee from the identity header set by the
//! upstream gateway.

use axum::{extract::FromRequestParts, http::request::Parts};
use hadir_core::{employee::Actor, session::SessionProvider, store::RecordStore};

use crate::{AppState, error::ApiError};

/// The authenticated caller. Present in a handler means the identity header
/// named an employee known to the directory.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<AppState<S>> for CurrentActor
where
  S: RecordStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let credential = parts
      .headers
      .get(state.config.identity_header.as_str())
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthenticated)?;

    let actor = state
      .sessions
      .current_actor(credential)
      .await
      .map_err(hadir_core::Error::store)?
      .ok_or(ApiError::Unauthenticated)?;

    Ok(Self(actor))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;
  use hadir_core::employee::Role;

  use super::*;
  use crate::tests::make_state;

  async fn extract(header: Option<&str>) -> Result<CurrentActor, ApiError> {
    let state = make_state().await;
    let mut builder = Request::builder().uri("/attendances/me");
    if let Some(value) = header {
      builder = builder.header("x-employee-id", value);
    }
    let (mut parts, _) = builder.body(()).unwrap().into_parts();
    CurrentActor::from_request_parts(&mut parts, &state).await
  }

  #[tokio::test]
  async fn known_employee_resolves() {
    let CurrentActor(actor) = extract(Some("H1")).await.unwrap();
    assert_eq!(actor.employee_id.as_str(), "H1");
    assert_eq!(actor.role, Role::Hr);
  }

  #[tokio::test]
  async fn missing_header_is_unauthenticated() {
    assert!(matches!(extract(None).await, Err(ApiError::Unauthenticated)));
  }

  #[tokio::test]
  async fn unknown_or_blank_identity_is_unauthenticated() {
    assert!(matches!(extract(Some("E404")).await, Err(ApiError::Unauthenticated)));
    assert!(matches!(extract(Some("   ")).await, Err(ApiError::Unauthenticated)));
  }
}
