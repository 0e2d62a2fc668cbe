//! Postal addresses.
//!
//! Partners send structured address components. We store them alongside a
//! formatted description and, when it can be resolved, an external place
//! identifier. Addresses with the same place identifier are shared between
//! users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured address components as supplied by a partner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerAddress {
  pub street_number:               String,
  pub route:                       String,
  pub subpremise:                  String,
  pub locality:                    String,
  pub administrative_area_level_1: String,
  pub administrative_area_level_2: String,
  pub postal_code:                 String,
  pub postal_code_suffix:          String,
  /// ISO 3166-1 alpha-2.
  pub country_code:                String,
}

impl PartnerAddress {
  /// Render a single-line description, e.g.
  /// `"350 Fifth Avenue, Suite 200, New York, NY 10118, US"`.
  ///
  /// Empty components are skipped. Place lookups use the form without the
  /// subpremise since unit numbers tend to confuse geocoders.
  pub fn formatted_description(&self, include_subpremise: bool) -> String {
    let street = join_non_empty(&[&self.street_number, &self.route], " ");
    let region =
      join_non_empty(&[&self.administrative_area_level_1, &self.postal_code], " ");

    let mut parts = vec![street];
    if include_subpremise {
      parts.push(self.subpremise.trim().to_owned());
    }
    parts.push(self.locality.trim().to_owned());
    parts.push(region);
    parts.push(self.country_code.trim().to_owned());

    parts.retain(|p| !p.is_empty());
    parts.join(", ")
  }

  /// Build the storable form of this address.
  pub fn into_new_address(self, google_place_id: Option<String>) -> NewAddress {
    NewAddress {
      formatted_description: self.formatted_description(true),
      google_place_id,
      components: self,
    }
  }
}

fn join_non_empty(parts: &[&String], sep: &str) -> String {
  parts
    .iter()
    .map(|p| p.trim())
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join(sep)
}

/// A persisted address row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub id:                    Uuid,
  pub formatted_description: String,
  pub google_place_id:       Option<String>,
  pub components:            PartnerAddress,
  pub created_at:            DateTime<Utc>,
}

/// An address to connect to a user. When `google_place_id` is set the store
/// reuses an existing row with the same identifier instead of inserting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
  pub formatted_description: String,
  pub google_place_id:       Option<String>,
  pub components:            PartnerAddress,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn address() -> PartnerAddress {
    PartnerAddress {
      street_number:               "350".into(),
      route:                       "Fifth Avenue".into(),
      subpremise:                  "Suite 200".into(),
      locality:                    "New York".into(),
      administrative_area_level_1: "NY".into(),
      administrative_area_level_2: "New York County".into(),
      postal_code:                 "10118".into(),
      postal_code_suffix:          "".into(),
      country_code:                "US".into(),
    }
  }

  #[test]
  fn description_with_subpremise() {
    assert_eq!(
      address().formatted_description(true),
      "350 Fifth Avenue, Suite 200, New York, NY 10118, US"
    );
  }

  #[test]
  fn description_without_subpremise() {
    assert_eq!(
      address().formatted_description(false),
      "350 Fifth Avenue, New York, NY 10118, US"
    );
  }

  #[test]
  fn description_skips_empty_components() {
    let a = PartnerAddress {
      street_number: "".into(),
      subpremise: "".into(),
      ..address()
    };
    assert_eq!(
      a.formatted_description(true),
      "Fifth Avenue, New York, NY 10118, US"
    );
  }
}
