//! Error type for `swc-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] swc_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),

  /// The email address does not exist or belongs to another user.
  #[error("email address {email_address_id} does not belong to user {user_id}")]
  ForeignEmailAddress {
    user_id:          uuid::Uuid,
    email_address_id: uuid::Uuid,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
