//! `POST /api/verified-swc-partner/user-action-opt-in`

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use swc_core::{
  action::OptInType, address::PartnerAddress, email::normalize_email,
  phone::normalize_phone_number, store::UserStore,
};
use swc_optin::{OptInInput, OptInResult, PartnerApiResponse};
use tracing::info;

use crate::{AppState, auth::AuthenticatedPartner, error::Error};

const NAME_MAX_CHARS: usize = 50;

/// Request body as sent by partners.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInBody {
  pub email_address:                         String,
  pub opt_in_type:                           OptInType,
  pub campaign_name:                         String,
  pub is_verified_email_address:             bool,
  pub first_name:                            Option<String>,
  pub last_name:                             Option<String>,
  pub address:                               Option<PartnerAddress>,
  pub phone_number:                          Option<String>,
  #[serde(rename = "hasOptedInToReceiveSMSFromSWC")]
  pub has_opted_in_to_receive_sms_from_swc:  Option<bool>,
  /// Accepted for compatibility. Every opt-in opts the user in to email.
  pub has_opted_in_to_emails:                Option<bool>,
  pub has_opted_in_to_membership:            Option<bool>,
}

fn name(field: &str, value: Option<String>) -> Result<Option<String>, Error> {
  let Some(value) = value else { return Ok(None) };
  let value = value.trim().to_owned();
  let len = value.chars().count();
  if len == 0 || len > NAME_MAX_CHARS {
    return Err(Error::BadRequest(format!(
      "{field} must be between 1 and {NAME_MAX_CHARS} characters"
    )));
  }
  Ok(Some(value))
}

impl OptInBody {
  /// Validate and normalise into service input.
  pub fn into_input(
    self,
    partner: swc_core::partner::VerifiedPartner,
  ) -> Result<OptInInput, Error> {
    let email_address = normalize_email(&self.email_address)
      .map_err(|e| Error::BadRequest(e.to_string()))?;

    if let Some(address) = &self.address
      && !(address.country_code.len() == 2
        && address.country_code.chars().all(|c| c.is_ascii_alphabetic()))
    {
      return Err(Error::BadRequest(
        "address.countryCode must be a two-letter country code".to_owned(),
      ));
    }

    let phone_number = self
      .phone_number
      .filter(|p| !p.trim().is_empty())
      .map(|p| normalize_phone_number(&p))
      .transpose()
      .map_err(|e| Error::BadRequest(e.to_string()))?;

    Ok(OptInInput {
      email_address,
      opt_in_type: self.opt_in_type,
      campaign_name: self.campaign_name,
      is_verified_email_address: self.is_verified_email_address,
      first_name: name("firstName", self.first_name)?,
      last_name: name("lastName", self.last_name)?,
      address: self.address,
      phone_number,
      has_opted_in_to_receive_sms_from_swc: self.has_opted_in_to_receive_sms_from_swc,
      has_opted_in_to_membership: self.has_opted_in_to_membership,
      partner,
    })
  }
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  AuthenticatedPartner(partner): AuthenticatedPartner,
  body: Result<Json<OptInBody>, JsonRejection>,
) -> Result<Json<PartnerApiResponse<OptInResult>>, Error>
where
  S: UserStore + 'static,
{
  let Json(body) = body.map_err(|e| Error::BadRequest(e.body_text()))?;
  let input = body.into_input(partner)?;

  let response = state.service.opt_in(input).await?;
  info!(
    user_id = %response.user_id,
    result = ?response.result,
    "verified partner opt-in handled"
  );
  Ok(Json(response))
}
