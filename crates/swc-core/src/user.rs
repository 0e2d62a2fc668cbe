//! Users and the records that hang off them.
//!
//! A [`User`] is the identity an opt-in resolves to. Contact channels
//! (email addresses), sessions and the postal address are separate rows; a
//! [`UserRecord`] bundles them for callers that need the whole picture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::address::{Address, NewAddress};

// ─── Enums ───────────────────────────────────────────────────────────────────

/// How much of a user's information may be shown publicly.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InformationVisibility {
  #[default]
  Anonymous,
  CryptoInfoOnly,
  AllInfo,
}

/// Where an email address came from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailAddressSource {
  /// Asserted by a verified partner on the user's behalf.
  VerifiedThirdParty,
  UserEntered,
  Thirdweb,
}

macro_rules! discriminant_impl {
  ($ty:ty, $kind:literal) => {
    impl $ty {
      /// The string stored in the database for this variant.
      pub fn discriminant(self) -> &'static str { self.into() }

      /// Parse a stored discriminant back into the enum.
      pub fn from_discriminant(s: &str) -> $crate::Result<Self> {
        <$ty as ::std::str::FromStr>::from_str(s).map_err(|_| {
          $crate::Error::UnknownVariant {
            kind:  $kind,
            value: s.to_owned(),
          }
        })
      }
    }
  };
}

pub(crate) use discriminant_impl;

discriminant_impl!(InformationVisibility, "information visibility");
discriminant_impl!(EmailAddressSource, "email address source");

// ─── Attribution ─────────────────────────────────────────────────────────────

/// Acquisition attribution stamped onto a user when it is first created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
  pub source:   String,
  pub medium:   String,
  pub campaign: String,
  pub referer:  String,
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:                            Uuid,
  pub created_at:                    DateTime<Utc>,
  pub first_name:                    Option<String>,
  pub last_name:                     Option<String>,
  /// E.164 formatted.
  pub phone_number:                  Option<String>,
  pub has_opted_in_to_emails:        bool,
  pub has_opted_in_to_sms:           bool,
  pub has_opted_in_to_membership:    bool,
  pub information_visibility:        InformationVisibility,
  pub referral_id:                   String,
  pub attribution:                   Attribution,
  pub primary_user_email_address_id: Option<Uuid>,
  pub address_id:                    Option<Uuid>,
}

/// A contact channel. Verification only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEmailAddress {
  pub id:            Uuid,
  pub user_id:       Uuid,
  pub email_address: String,
  pub is_verified:   bool,
  pub source:        EmailAddressSource,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// A user together with its email addresses, sessions and address.
///
/// `email_addresses` and `sessions` are ordered oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  pub user:            User,
  pub email_addresses: Vec<UserEmailAddress>,
  pub sessions:        Vec<UserSession>,
  pub address:         Option<Address>,
}

impl UserRecord {
  /// The email address the primary pointer refers to, if any.
  pub fn primary_email(&self) -> Option<&UserEmailAddress> {
    let id = self.user.primary_user_email_address_id?;
    self.email_addresses.iter().find(|e| e.id == id)
  }

  /// The most recently added address equal to `email_address`.
  pub fn latest_email_matching(
    &self,
    email_address: &str,
  ) -> Option<&UserEmailAddress> {
    self
      .email_addresses
      .iter()
      .rev()
      .find(|e| e.email_address == email_address)
  }

  pub fn owns_email(&self, email_address: &str) -> bool {
    self
      .email_addresses
      .iter()
      .any(|e| e.email_address == email_address)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// An email address to attach to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmailAddress {
  pub email_address: String,
  pub is_verified:   bool,
  pub source:        EmailAddressSource,
}

/// Input to [`crate::store::UserStore::create_user`].
///
/// The store assigns ids and timestamps, inserts `email_address` as the
/// user's first address and opens one session. The primary pointer is left
/// unset; callers promote the created address afterwards.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub attribution:                Attribution,
  pub referral_id:                String,
  pub information_visibility:     InformationVisibility,
  pub first_name:                 Option<String>,
  pub last_name:                  Option<String>,
  pub phone_number:               Option<String>,
  pub has_opted_in_to_emails:     bool,
  pub has_opted_in_to_sms:        bool,
  pub has_opted_in_to_membership: bool,
  pub email_address:              NewEmailAddress,
  pub address:                    Option<NewAddress>,
}
