//! Field patches for existing users.
//!
//! A repeated opt-in may carry profile data we have not seen before. We never
//! overwrite what a user already has: text fields are only backfilled when
//! empty, and opt-in flags only ever move from `false` to `true`. The rules
//! are applied per field by [`UserPatch::plan`], which is pure; the store
//! applies the resulting patch.

use uuid::Uuid;

use crate::{
  address::NewAddress,
  user::{NewEmailAddress, UserRecord},
};

/// Profile fields a caller may supply alongside an opt-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
  pub first_name:                 Option<String>,
  pub last_name:                  Option<String>,
  pub phone_number:               Option<String>,
  pub has_opted_in_to_sms:        bool,
  pub has_opted_in_to_membership: bool,
}

/// Every update that may be applied to an existing user. `None` means
/// "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
  pub first_name:                 Option<String>,
  pub last_name:                  Option<String>,
  pub phone_number:               Option<String>,
  pub has_opted_in_to_emails:     Option<bool>,
  pub has_opted_in_to_sms:        Option<bool>,
  pub has_opted_in_to_membership: Option<bool>,
  /// Attach a new email address to the user.
  pub new_email_address:          Option<NewEmailAddress>,
  /// Mark an existing, unverified email address as verified.
  pub verify_email_address_id:    Option<Uuid>,
  /// Connect (or create) this address and point the user at it.
  pub address:                    Option<NewAddress>,
}

/// Take `incoming` only when `current` is empty.
pub fn backfill(current: Option<&str>, incoming: Option<&str>) -> Option<String> {
  let current_is_empty = current.is_none_or(str::is_empty);
  match incoming {
    Some(v) if current_is_empty && !v.is_empty() => Some(v.to_owned()),
    _ => None,
  }
}

/// Raise a flag that is currently off. Flags are never lowered.
pub fn raise(current: bool, incoming: bool) -> Option<bool> {
  (incoming && !current).then_some(true)
}

impl UserPatch {
  /// Work out what an opt-in for `email` should change on `existing`.
  ///
  /// Email opt-in is always raised: the opt-in itself is consent to email.
  pub fn plan(
    existing: &UserRecord,
    profile: &ProfileUpdate,
    email: &NewEmailAddress,
    address: Option<NewAddress>,
  ) -> Self {
    let user = &existing.user;

    let (new_email_address, verify_email_address_id) =
      match existing.latest_email_matching(&email.email_address) {
        None => (Some(email.clone()), None),
        Some(owned) if !owned.is_verified && email.is_verified => {
          (None, Some(owned.id))
        }
        Some(_) => (None, None),
      };

    Self {
      first_name: backfill(
        user.first_name.as_deref(),
        profile.first_name.as_deref(),
      ),
      last_name: backfill(
        user.last_name.as_deref(),
        profile.last_name.as_deref(),
      ),
      phone_number: backfill(
        user.phone_number.as_deref(),
        profile.phone_number.as_deref(),
      ),
      has_opted_in_to_emails: raise(user.has_opted_in_to_emails, true),
      has_opted_in_to_sms: raise(
        user.has_opted_in_to_sms,
        profile.has_opted_in_to_sms,
      ),
      has_opted_in_to_membership: raise(
        user.has_opted_in_to_membership,
        profile.has_opted_in_to_membership,
      ),
      new_email_address,
      verify_email_address_id,
      address,
    }
  }

  /// Names of the fields this patch touches, for the mutation log line.
  pub fn changed_fields(&self) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if self.first_name.is_some() {
      fields.push("first_name");
    }
    if self.last_name.is_some() {
      fields.push("last_name");
    }
    if self.phone_number.is_some() {
      fields.push("phone_number");
    }
    if self.has_opted_in_to_emails.is_some() {
      fields.push("has_opted_in_to_emails");
    }
    if self.has_opted_in_to_sms.is_some() {
      fields.push("has_opted_in_to_sms");
    }
    if self.has_opted_in_to_membership.is_some() {
      fields.push("has_opted_in_to_membership");
    }
    if self.new_email_address.is_some() {
      fields.push("user_email_addresses");
    }
    if self.verify_email_address_id.is_some() {
      fields.push("email_verification");
    }
    if self.address.is_some() {
      fields.push("address");
    }
    fields
  }

  pub fn is_empty(&self) -> bool { self.changed_fields().is_empty() }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::user::{
    Attribution, EmailAddressSource, InformationVisibility, User,
    UserEmailAddress,
  };

  fn record(email: &str, verified: bool) -> UserRecord {
    let user_id = Uuid::new_v4();
    let email_id = Uuid::new_v4();
    UserRecord {
      user:            User {
        id:                            user_id,
        created_at:                    Utc::now(),
        first_name:                    Some("Alice".into()),
        last_name:                     None,
        phone_number:                  None,
        has_opted_in_to_emails:        true,
        has_opted_in_to_sms:           true,
        has_opted_in_to_membership:    false,
        information_visibility:        InformationVisibility::Anonymous,
        referral_id:                   "abc123".into(),
        attribution:                   Attribution::default(),
        primary_user_email_address_id: Some(email_id),
        address_id:                    None,
      },
      email_addresses: vec![UserEmailAddress {
        id:            email_id,
        user_id,
        email_address: email.into(),
        is_verified:   verified,
        source:        EmailAddressSource::VerifiedThirdParty,
        created_at:    Utc::now(),
      }],
      sessions:        vec![],
      address:         None,
    }
  }

  fn email(address: &str, verified: bool) -> NewEmailAddress {
    NewEmailAddress {
      email_address: address.into(),
      is_verified:   verified,
      source:        EmailAddressSource::VerifiedThirdParty,
    }
  }

  #[test]
  fn backfill_only_fills_empty_fields() {
    assert_eq!(backfill(None, Some("Bob")), Some("Bob".into()));
    assert_eq!(backfill(Some(""), Some("Bob")), Some("Bob".into()));
    assert_eq!(backfill(Some("Alice"), Some("Bob")), None);
    assert_eq!(backfill(None, None), None);
    assert_eq!(backfill(None, Some("")), None);
  }

  #[test]
  fn raise_never_lowers() {
    assert_eq!(raise(false, true), Some(true));
    assert_eq!(raise(true, true), None);
    assert_eq!(raise(true, false), None);
    assert_eq!(raise(false, false), None);
  }

  #[test]
  fn plan_keeps_populated_fields_and_fills_empty_ones() {
    let existing = record("a@x.com", true);
    let profile = ProfileUpdate {
      first_name: Some("Bob".into()),
      last_name: Some("Smith".into()),
      has_opted_in_to_sms: false,
      has_opted_in_to_membership: true,
      ..Default::default()
    };

    let patch = UserPatch::plan(&existing, &profile, &email("a@x.com", true), None);

    assert_eq!(patch.first_name, None);
    assert_eq!(patch.last_name.as_deref(), Some("Smith"));
    assert_eq!(patch.has_opted_in_to_emails, None);
    assert_eq!(patch.has_opted_in_to_sms, None);
    assert_eq!(patch.has_opted_in_to_membership, Some(true));
    assert_eq!(patch.new_email_address, None);
    assert_eq!(patch.changed_fields(), ["last_name", "has_opted_in_to_membership"]);
  }

  #[test]
  fn plan_is_empty_when_nothing_new() {
    let existing = record("a@x.com", true);
    let patch = UserPatch::plan(
      &existing,
      &ProfileUpdate::default(),
      &email("a@x.com", false),
      None,
    );
    assert!(patch.is_empty(), "{patch:?}");
  }

  #[test]
  fn plan_adds_unseen_email() {
    let existing = record("a@x.com", true);
    let patch = UserPatch::plan(
      &existing,
      &ProfileUpdate::default(),
      &email("b@x.com", true),
      None,
    );
    assert_eq!(patch.new_email_address, Some(email("b@x.com", true)));
    assert_eq!(patch.verify_email_address_id, None);
  }

  #[test]
  fn plan_verifies_owned_unverified_email() {
    let existing = record("a@x.com", false);
    let patch = UserPatch::plan(
      &existing,
      &ProfileUpdate::default(),
      &email("a@x.com", true),
      None,
    );
    assert_eq!(
      patch.verify_email_address_id,
      Some(existing.email_addresses[0].id)
    );
    assert_eq!(patch.new_email_address, None);
  }

  #[test]
  fn plan_raises_email_opt_in() {
    let mut existing = record("a@x.com", true);
    existing.user.has_opted_in_to_emails = false;
    let patch = UserPatch::plan(
      &existing,
      &ProfileUpdate::default(),
      &email("a@x.com", true),
      None,
    );
    assert_eq!(patch.has_opted_in_to_emails, Some(true));
  }
}
