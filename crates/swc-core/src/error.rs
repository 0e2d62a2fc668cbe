//! Error types for `swc-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("invalid phone number: {0:?}")]
  InvalidPhoneNumber(String),

  #[error("invalid email address: {0:?}")]
  InvalidEmailAddress(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
