//! Email address helpers.

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Trim and lower-case an email address, rejecting obviously malformed input.
///
/// This is a shape check, not RFC 5322 validation: exactly one `@`, a
/// non-empty local part, and a dotted domain without empty labels.
pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_lowercase();
  let invalid = || Error::InvalidEmailAddress(raw.to_owned());

  let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
  if local.is_empty()
    || domain.contains('@')
    || email.chars().any(char::is_whitespace)
    || !domain.contains('.')
    || domain.split('.').any(str::is_empty)
  {
    return Err(invalid());
  }
  Ok(email)
}

/// Short, stable fingerprint of an email address for log lines.
///
/// Logs carry this instead of the address itself.
pub fn email_fingerprint(email: &str) -> String {
  let hash = Sha256::digest(email.trim().to_lowercase().as_bytes());
  hex::encode(&hash[..6])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalizes_case_and_whitespace() {
    assert_eq!(
      normalize_email("  Alice@Example.COM ").unwrap(),
      "alice@example.com"
    );
  }

  #[test]
  fn rejects_malformed() {
    for bad in ["", "alice", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@b..com"] {
      assert!(normalize_email(bad).is_err(), "accepted {bad:?}");
    }
  }

  #[test]
  fn fingerprint_is_case_insensitive_and_short() {
    let a = email_fingerprint("alice@example.com");
    assert_eq!(a, email_fingerprint("ALICE@example.com"));
    assert_eq!(a.len(), 12);
    assert_ne!(a, email_fingerprint("bob@example.com"));
  }
}
