//! Error type for `swc-optin`.

use thiserror::Error;
use uuid::Uuid;

/// A failure that aborts an opt-in request.
///
/// Place lookup, event dispatch and analytics failures are not represented
/// here: they are logged and the request carries on.
#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A relation that must exist after a write is absent.
  #[error("user {user_id} has no {relation}")]
  MissingRelation {
    user_id:  Uuid,
    relation: &'static str,
  },
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
