//! The advocate CRM (Capitol Canary) payload and request body.
//!
//! The opt-in flow only emits an [`UpsertAdvocatePayload`] as an event. The
//! consumer of that event turns it into an advocate update request with
//! [`format_advocate_update_request`].

use serde::{Deserialize, Serialize};
use swc_core::{
  address::{Address, PartnerAddress},
  user::{User, UserEmailAddress},
};

pub const UPSERT_ADVOCATE_EVENT_NAME: &str = "capitol-canary/upsert-advocate";

/// Advocate CRM campaign ids, from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignIds {
  pub one_click_native_subscriber: u64,
  pub default_membership:          u64,
}

impl Default for CampaignIds {
  fn default() -> Self {
    Self {
      one_click_native_subscriber: 146_792,
      default_membership:          142_628,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvocateCampaign {
  OneClickNativeSubscriber,
  DefaultMembership,
}

impl CampaignIds {
  pub fn get(&self, campaign: AdvocateCampaign) -> u64 {
    match campaign {
      AdvocateCampaign::OneClickNativeSubscriber => self.one_click_native_subscriber,
      AdvocateCampaign::DefaultMembership => self.default_membership,
    }
  }
}

/// Snapshot of the user sent to the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvocateUser {
  #[serde(flatten)]
  pub user:        User,
  pub address:     Option<Address>,
  /// The CRM's id for this person, once it has one.
  pub advocate_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvocateOptions {
  pub is_email_optin:                     bool,
  pub is_email_optout:                    bool,
  pub is_sms_optin:                       bool,
  pub is_sms_optout:                      bool,
  pub should_send_sms_optin_confirmation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvocateMetadata {
  pub p2a_source:   Option<String>,
  pub utm_source:   Option<String>,
  pub utm_medium:   Option<String>,
  pub utm_campaign: Option<String>,
  pub utm_term:     Option<String>,
  pub utm_content:  Option<String>,
  #[serde(default)]
  pub tags:         Vec<String>,
}

/// Data of an [`UPSERT_ADVOCATE_EVENT_NAME`] event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAdvocatePayload {
  pub campaign_id:        u64,
  pub user:               AdvocateUser,
  pub user_email_address: Option<UserEmailAddress>,
  pub opts:               AdvocateOptions,
  pub metadata:           Option<AdvocateMetadata>,
}

// ─── Request body ────────────────────────────────────────────────────────────

/// Body of an advocate update request. `None` fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdvocateUpdateRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub advocateid:        Option<u64>,
  pub campaigns:         Vec<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub firstname:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lastname:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address1:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address2:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city:              Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state:             Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub zip5:              Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country:           Option<String>,
  #[serde(rename = "emailOptin")]
  pub email_optin:       u8,
  #[serde(rename = "emailOptout")]
  pub email_optout:      u8,
  #[serde(rename = "smsOptin")]
  pub sms_optin:         u8,
  #[serde(rename = "smsOptout")]
  pub sms_optout:        u8,
  #[serde(rename = "smsOptinConfirmed", skip_serializing_if = "Option::is_none")]
  pub sms_optin_confirmed: Option<u8>,
  #[serde(rename = "p2aSource", skip_serializing_if = "Option::is_none")]
  pub p2a_source:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub utm_source:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub utm_medium:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub utm_campaign:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub utm_term:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub utm_content:       Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub tags:              Vec<String>,
}

fn non_empty(s: &str) -> Option<String> {
  let s = s.trim();
  (!s.is_empty()).then(|| s.to_owned())
}

fn flag(b: bool) -> u8 { u8::from(b) }

/// `postal_code`, with `-{postal_code_suffix}` when there is one.
fn zip(address: &PartnerAddress) -> Option<String> {
  let code = non_empty(&address.postal_code)?;
  Some(match non_empty(&address.postal_code_suffix) {
    Some(suffix) => format!("{code}-{suffix}"),
    None => code,
  })
}

pub fn format_advocate_update_request(
  payload: &UpsertAdvocatePayload,
) -> AdvocateUpdateRequest {
  let user = &payload.user.user;
  let address = payload.user.address.as_ref().map(|a| &a.components);
  let metadata = payload.metadata.clone().unwrap_or_default();
  let opts = payload.opts;

  AdvocateUpdateRequest {
    advocateid: payload.user.advocate_id,
    campaigns: vec![payload.campaign_id],
    email: payload
      .user_email_address
      .as_ref()
      .map(|e| e.email_address.clone()),
    firstname: user.first_name.as_deref().and_then(non_empty),
    lastname: user.last_name.as_deref().and_then(non_empty),
    phone: user.phone_number.as_deref().and_then(non_empty),
    address1: address
      .and_then(|a| non_empty(&format!("{} {}", a.street_number, a.route))),
    address2: address.and_then(|a| non_empty(&a.subpremise)),
    city: address.and_then(|a| non_empty(&a.locality)),
    state: address.and_then(|a| non_empty(&a.administrative_area_level_1)),
    zip5: address.and_then(zip),
    country: address.and_then(|a| non_empty(&a.country_code)),
    email_optin: flag(opts.is_email_optin),
    email_optout: flag(opts.is_email_optout),
    sms_optin: flag(opts.is_sms_optin),
    sms_optout: flag(opts.is_sms_optout),
    sms_optin_confirmed: (opts.is_sms_optin
      && !opts.should_send_sms_optin_confirmation)
      .then_some(1),
    p2a_source: metadata.p2a_source,
    utm_source: metadata.utm_source,
    utm_medium: metadata.utm_medium,
    utm_campaign: metadata.utm_campaign,
    utm_term: metadata.utm_term,
    utm_content: metadata.utm_content,
    tags: metadata.tags,
  }
}
