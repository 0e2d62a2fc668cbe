//! Request and response shapes of the opt-in flow.

use serde::{Deserialize, Serialize};
use swc_core::{
  action::OptInType,
  address::PartnerAddress,
  partner::VerifiedPartner,
  patch::ProfileUpdate,
  user::{EmailAddressSource, NewEmailAddress},
};
use uuid::Uuid;

/// A validated opt-in request from a verified partner.
///
/// `email_address` is expected to be normalised already and `phone_number`
/// to be E.164.
#[derive(Debug, Clone)]
pub struct OptInInput {
  pub email_address:                        String,
  pub opt_in_type:                          OptInType,
  /// The partner's campaign; used for attribution and analytics only.
  pub campaign_name:                        String,
  pub is_verified_email_address:            bool,
  pub first_name:                           Option<String>,
  pub last_name:                            Option<String>,
  pub address:                              Option<PartnerAddress>,
  pub phone_number:                         Option<String>,
  pub has_opted_in_to_receive_sms_from_swc: Option<bool>,
  pub has_opted_in_to_membership:           Option<bool>,
  pub partner:                              VerifiedPartner,
}

impl OptInInput {
  pub fn profile(&self) -> ProfileUpdate {
    ProfileUpdate {
      first_name:                 self.first_name.clone(),
      last_name:                  self.last_name.clone(),
      phone_number:               self.phone_number.clone(),
      has_opted_in_to_sms:        self.sms_opt_in(),
      has_opted_in_to_membership: self.has_opted_in_to_membership.unwrap_or(false),
    }
  }

  pub fn email(&self) -> NewEmailAddress {
    NewEmailAddress {
      email_address: self.email_address.clone(),
      is_verified:   self.is_verified_email_address,
      source:        EmailAddressSource::VerifiedThirdParty,
    }
  }

  pub fn sms_opt_in(&self) -> bool {
    self.has_opted_in_to_receive_sms_from_swc.unwrap_or(false)
  }
}

/// Whether the request created an action or found one already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptInResult {
  NewAction,
  ExistingAction,
}

impl OptInResult {
  pub const ALL: [Self; 2] = [Self::NewAction, Self::ExistingAction];
}

/// What happened to the user record while resolving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserState {
  New,
  Existing,
  #[serde(rename = "Existing With Updates")]
  ExistingWithUpdates,
}

/// The body returned to a partner.
///
/// `session_id` stays the same across repeated opt-ins for one user, so the
/// partner can keep referring to the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerApiResponse<R> {
  pub result:         R,
  pub result_options: Vec<R>,
  pub session_id:     Uuid,
  pub user_id:        Uuid,
}

impl PartnerApiResponse<OptInResult> {
  pub fn opt_in(result: OptInResult, session_id: Uuid, user_id: Uuid) -> Self {
    Self {
      result,
      result_options: OptInResult::ALL.to_vec(),
      session_id,
      user_id,
    }
  }
}
