//! Verified partners: third parties allowed to opt users in on their behalf.

use serde::{Deserialize, Serialize};

use crate::user::Attribution;

/// Acquisition medium recorded for users created through a partner.
pub const VERIFIED_PARTNER_MEDIUM: &str = "verified-swc-partner";

/// The name a partner authenticates as, e.g. `"coinbase"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedPartner(pub String);

impl VerifiedPartner {
  pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Attribution stamped onto users this partner creates.
  pub fn attribution(&self, campaign_name: &str) -> Attribution {
    Attribution {
      source:   self.0.clone(),
      medium:   VERIFIED_PARTNER_MEDIUM.to_owned(),
      campaign: campaign_name.to_owned(),
      referer:  String::new(),
    }
  }
}

impl std::fmt::Display for VerifiedPartner {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}
