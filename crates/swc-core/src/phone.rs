//! Phone number normalisation.

use crate::{Error, Result};

/// Normalise a phone number to E.164.
///
/// Formatting characters (spaces, dashes, dots, parentheses) are stripped.
/// Bare 10-digit numbers are taken to be North American and get a `+1`
/// prefix. Anything else must carry its country code.
pub fn normalize_phone_number(raw: &str) -> Result<String> {
  let trimmed = raw.trim();
  let has_plus = trimmed.starts_with('+');
  let invalid = || Error::InvalidPhoneNumber(raw.to_owned());

  let mut digits = String::with_capacity(trimmed.len());
  for (i, c) in trimmed.chars().enumerate() {
    match c {
      '0'..='9' => digits.push(c),
      '+' if i == 0 => {}
      ' ' | '-' | '.' | '(' | ')' => {}
      _ => return Err(invalid()),
    }
  }

  let e164 = match (has_plus, digits.len()) {
    (false, 10) => format!("+1{digits}"),
    (false, 11) if digits.starts_with('1') => format!("+{digits}"),
    (true, 10..=15) => format!("+{digits}"),
    _ => return Err(invalid()),
  };
  Ok(e164)
}
