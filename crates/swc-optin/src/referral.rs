//! Referral identifiers handed out to new users.

use rand_core::{OsRng, RngCore};

const ALPHABET: &[u8] =
  b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const REFERRAL_ID_LEN: usize = 6;

/// A fresh, opaque, URL-safe referral id.
pub fn generate_referral_id() -> String {
  let mut bytes = [0u8; REFERRAL_ID_LEN];
  OsRng.fill_bytes(&mut bytes);
  bytes
    .iter()
    .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
    .collect()
}
