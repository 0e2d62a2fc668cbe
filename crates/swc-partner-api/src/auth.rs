//! HTTP Basic auth for verified partners.
//!
//! The username names the partner and the password is its API key, checked
//! against the argon2 PHC hash configured for that partner.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use swc_core::{partner::VerifiedPartner, store::UserStore};
use tracing::warn;

use crate::{AppState, config::PartnerConfig, error::Error};

/// API key hashes by partner name.
#[derive(Debug, Clone, Default)]
pub struct PartnerCredentials {
  hashes: HashMap<String, String>,
}

impl PartnerCredentials {
  pub fn new(partners: &[PartnerConfig]) -> Self {
    Self {
      hashes: partners
        .iter()
        .map(|p| (p.name.clone(), p.api_key_hash.clone()))
        .collect(),
    }
  }

  pub fn len(&self) -> usize { self.hashes.len() }

  pub fn is_empty(&self) -> bool { self.hashes.is_empty() }
}

/// The partner a request authenticated as.
pub struct AuthenticatedPartner(pub VerifiedPartner);

pub fn verify_partner(
  headers: &HeaderMap,
  credentials: &PartnerCredentials,
) -> Result<VerifiedPartner, Error> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;
  let (name, api_key) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let hash = credentials.hashes.get(name).ok_or_else(|| {
    warn!(partner = name, "unknown partner");
    Error::Unauthorized
  })?;
  let parsed = PasswordHash::new(hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(api_key.as_bytes(), &parsed)
    .map_err(|_| {
      warn!(partner = name, "partner api key rejected");
      Error::Unauthorized
    })?;

  Ok(VerifiedPartner::new(name))
}

impl<S> FromRequestParts<AppState<S>> for AuthenticatedPartner
where
  S: UserStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_partner(&parts.headers, &state.partners).map(AuthenticatedPartner)
  }
}
