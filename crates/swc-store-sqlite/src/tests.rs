//! Integration tests for `SqliteStore` against an in-memory database.

use swc_core::{
  action::{ActionType, NewUserAction, OptInType},
  address::{NewAddress, PartnerAddress},
  patch::UserPatch,
  store::UserStore,
  user::{
    Attribution, EmailAddressSource, InformationVisibility, NewEmailAddress,
    NewUser,
  },
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn email(address: &str, verified: bool) -> NewEmailAddress {
  NewEmailAddress {
    email_address: address.into(),
    is_verified:   verified,
    source:        EmailAddressSource::VerifiedThirdParty,
  }
}

fn new_user(address: &str) -> NewUser {
  NewUser {
    attribution:                Attribution {
      source:   "coinbase".into(),
      medium:   "verified-swc-partner".into(),
      campaign: "c1".into(),
      referer:  String::new(),
    },
    referral_id:                "AbC123".into(),
    information_visibility:     InformationVisibility::Anonymous,
    first_name:                 Some("Alice".into()),
    last_name:                  None,
    phone_number:               None,
    has_opted_in_to_emails:     true,
    has_opted_in_to_sms:        false,
    has_opted_in_to_membership: false,
    email_address:              email(address, true),
    address:                    None,
  }
}

fn new_address(place_id: Option<&str>) -> NewAddress {
  PartnerAddress {
    street_number: "350".into(),
    route: "Fifth Avenue".into(),
    locality: "New York".into(),
    administrative_area_level_1: "NY".into(),
    postal_code: "10118".into(),
    country_code: "US".into(),
    ..Default::default()
  }
  .into_new_address(place_id.map(str::to_owned))
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_user_with_email_and_session() {
  let s = store().await;

  let record = s.create_user(new_user("a@x.com")).await.unwrap();
  assert_eq!(record.user.first_name.as_deref(), Some("Alice"));
  assert_eq!(record.user.attribution.source, "coinbase");
  assert_eq!(record.user.referral_id, "AbC123");
  assert!(record.user.has_opted_in_to_emails);
  assert_eq!(record.user.primary_user_email_address_id, None);
  assert_eq!(record.email_addresses.len(), 1);
  assert_eq!(record.email_addresses[0].email_address, "a@x.com");
  assert!(record.email_addresses[0].is_verified);
  assert_eq!(record.sessions.len(), 1);
  assert!(record.address.is_none());

  let fetched = s.get_user(record.user.id).await.unwrap().unwrap();
  assert_eq!(fetched, record);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn set_primary_email_points_at_owned_address() {
  let s = store().await;
  let record = s.create_user(new_user("a@x.com")).await.unwrap();
  let email_id = record.email_addresses[0].id;

  s.set_primary_email(record.user.id, email_id).await.unwrap();

  let fetched = s.get_user(record.user.id).await.unwrap().unwrap();
  assert_eq!(fetched.user.primary_user_email_address_id, Some(email_id));
  assert_eq!(fetched.primary_email().unwrap().email_address, "a@x.com");
}

#[tokio::test]
async fn set_primary_email_rejects_foreign_address() {
  let s = store().await;
  let alice = s.create_user(new_user("a@x.com")).await.unwrap();
  let bob = s.create_user(new_user("b@x.com")).await.unwrap();

  let err = s
    .set_primary_email(alice.user.id, bob.email_addresses[0].id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ForeignEmailAddress { .. }), "{err}");
}

#[tokio::test]
async fn find_user_by_email() {
  let s = store().await;
  let record = s.create_user(new_user("a@x.com")).await.unwrap();

  let found = s.find_user_by_email("a@x.com").await.unwrap().unwrap();
  assert_eq!(found.user.id, record.user.id);
  assert!(s.find_user_by_email("nobody@x.com").await.unwrap().is_none());
}

// ─── Patches ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_user_applies_patch_fields() {
  let s = store().await;
  let record = s.create_user(new_user("a@x.com")).await.unwrap();

  let patch = UserPatch {
    last_name: Some("Liddell".into()),
    phone_number: Some("+15551234567".into()),
    has_opted_in_to_sms: Some(true),
    new_email_address: Some(email("alice@work.com", false)),
    ..Default::default()
  };
  let updated = s.update_user(record.user.id, &patch).await.unwrap();

  assert_eq!(updated.user.first_name.as_deref(), Some("Alice"));
  assert_eq!(updated.user.last_name.as_deref(), Some("Liddell"));
  assert_eq!(updated.user.phone_number.as_deref(), Some("+15551234567"));
  assert!(updated.user.has_opted_in_to_sms);
  assert!(!updated.user.has_opted_in_to_membership);
  assert_eq!(updated.email_addresses.len(), 2);
  assert_eq!(updated.email_addresses[1].email_address, "alice@work.com");
  assert!(!updated.email_addresses[1].is_verified);
}

#[tokio::test]
async fn update_user_verifies_email() {
  let s = store().await;
  let mut input = new_user("a@x.com");
  input.email_address.is_verified = false;
  let record = s.create_user(input).await.unwrap();
  assert!(!record.email_addresses[0].is_verified);

  let patch = UserPatch {
    verify_email_address_id: Some(record.email_addresses[0].id),
    ..Default::default()
  };
  let updated = s.update_user(record.user.id, &patch).await.unwrap();
  assert!(updated.email_addresses[0].is_verified);
}

#[tokio::test]
async fn update_missing_user_is_an_error() {
  let s = store().await;
  let err = s
    .update_user(Uuid::new_v4(), &UserPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)), "{err}");
}

// ─── Addresses ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn addresses_with_same_place_id_are_shared() {
  let s = store().await;

  let mut alice = new_user("a@x.com");
  alice.address = Some(new_address(Some("place-1")));
  let alice = s.create_user(alice).await.unwrap();

  let mut bob = new_user("b@x.com");
  bob.address = Some(new_address(Some("place-1")));
  let bob = s.create_user(bob).await.unwrap();

  assert_eq!(alice.user.address_id, bob.user.address_id);
  assert_eq!(
    bob.address.as_ref().unwrap().google_place_id.as_deref(),
    Some("place-1")
  );
  assert_eq!(s.count_addresses().await.unwrap(), 1);
}

#[tokio::test]
async fn unresolved_addresses_are_never_shared() {
  let s = store().await;
  let alice = s.create_user(new_user("a@x.com")).await.unwrap();
  let bob = s.create_user(new_user("b@x.com")).await.unwrap();

  let patch = UserPatch {
    address: Some(new_address(None)),
    ..Default::default()
  };
  let alice = s.update_user(alice.user.id, &patch).await.unwrap();
  let bob = s.update_user(bob.user.id, &patch).await.unwrap();

  assert_ne!(alice.user.address_id, bob.user.address_id);
  assert_eq!(
    alice.address.unwrap().formatted_description,
    "350 Fifth Avenue, New York, NY 10118, US"
  );
  assert_eq!(s.count_addresses().await.unwrap(), 2);
}

// ─── Actions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_opt_in_action_matches_kind_and_email() {
  let s = store().await;
  let record = s.create_user(new_user("a@x.com")).await.unwrap();
  let action = s
    .create_action(NewUserAction::opt_in(record.user.id, OptInType::Sms))
    .await
    .unwrap();
  assert_eq!(action.campaign_name, "DEFAULT");

  let found = s
    .find_opt_in_action(ActionType::OptIn, Some(OptInType::Sms), "a@x.com")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.action, action);
  assert_eq!(found.user.user.id, record.user.id);

  let other_kind = s
    .find_opt_in_action(
      ActionType::OptIn,
      Some(OptInType::SwcSignUpAsSubscriber),
      "a@x.com",
    )
    .await
    .unwrap();
  assert!(other_kind.is_none());

  let other_email = s
    .find_opt_in_action(ActionType::OptIn, Some(OptInType::Sms), "b@x.com")
    .await
    .unwrap();
  assert!(other_email.is_none());
}

#[tokio::test]
async fn find_opt_in_action_matches_secondary_email() {
  let s = store().await;
  let record = s.create_user(new_user("a@x.com")).await.unwrap();
  s.create_action(NewUserAction::opt_in(record.user.id, OptInType::Sms))
    .await
    .unwrap();
  let patch = UserPatch {
    new_email_address: Some(email("alice@work.com", true)),
    ..Default::default()
  };
  s.update_user(record.user.id, &patch).await.unwrap();

  let found = s
    .find_opt_in_action(ActionType::OptIn, Some(OptInType::Sms), "alice@work.com")
    .await
    .unwrap();
  assert!(found.is_some());
}

#[tokio::test]
async fn list_actions_in_insertion_order() {
  let s = store().await;
  let record = s.create_user(new_user("a@x.com")).await.unwrap();
  s.create_action(NewUserAction::opt_in(record.user.id, OptInType::Sms))
    .await
    .unwrap();
  s.create_action(NewUserAction {
    user_id:       record.user.id,
    action_type:   ActionType::Call,
    opt_in_type:   None,
    campaign_name: "call-your-rep".into(),
  })
  .await
  .unwrap();

  let actions = s.list_actions(record.user.id).await.unwrap();
  assert_eq!(actions.len(), 2);
  assert_eq!(actions[0].action_type, ActionType::OptIn);
  assert_eq!(actions[1].action_type, ActionType::Call);
  assert_eq!(actions[1].opt_in_type, None);
}

#[tokio::test]
async fn create_action_for_missing_user_fails() {
  let s = store().await;
  let result = s
    .create_action(NewUserAction::opt_in(Uuid::new_v4(), OptInType::Sms))
    .await;
  assert!(matches!(result, Err(Error::Database(_))));
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_session_appends() {
  let s = store().await;
  let record = s.create_user(new_user("a@x.com")).await.unwrap();
  let session = s.create_session(record.user.id).await.unwrap();

  let fetched = s.get_user(record.user.id).await.unwrap().unwrap();
  assert_eq!(fetched.sessions.len(), 2);
  assert_eq!(fetched.sessions[1], session);
}
