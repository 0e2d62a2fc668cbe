//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Enums are stored as their
//! `SCREAMING_SNAKE_CASE` discriminants.

use chrono::{DateTime, Utc};
use swc_core::{
  action::{ActionType, OptInType, UserAction},
  address::{Address, NewAddress, PartnerAddress},
  user::{
    Attribution, EmailAddressSource, InformationVisibility, NewEmailAddress,
    User, UserEmailAddress, UserRecord, UserSession,
  },
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ─────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, created_at, first_name, last_name, \
  phone_number, has_opted_in_to_emails, has_opted_in_to_sms, \
  has_opted_in_to_membership, information_visibility, referral_id, \
  acquisition_source, acquisition_medium, acquisition_campaign, \
  acquisition_referer, primary_user_email_address_id, address_id";

pub const EMAIL_COLUMNS: &str =
  "id, user_id, email_address, is_verified, source, created_at";

pub const SESSION_COLUMNS: &str = "id, user_id, created_at";

pub const ADDRESS_COLUMNS: &str = "id, google_place_id, \
  formatted_description, street_number, route, subpremise, locality, \
  administrative_area_level_1, administrative_area_level_2, postal_code, \
  postal_code_suffix, country_code, created_at";

pub const ACTION_COLUMNS: &str =
  "id, user_id, action_type, opt_in_type, campaign_name, created_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:                            String,
  pub created_at:                    String,
  pub first_name:                    Option<String>,
  pub last_name:                     Option<String>,
  pub phone_number:                  Option<String>,
  pub has_opted_in_to_emails:        bool,
  pub has_opted_in_to_sms:           bool,
  pub has_opted_in_to_membership:    bool,
  pub information_visibility:        String,
  pub referral_id:                   String,
  pub acquisition_source:            String,
  pub acquisition_medium:            String,
  pub acquisition_campaign:          String,
  pub acquisition_referer:           String,
  pub primary_user_email_address_id: Option<String>,
  pub address_id:                    Option<String>,
}

impl RawUser {
  /// Map a row selected with [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                            row.get(0)?,
      created_at:                    row.get(1)?,
      first_name:                    row.get(2)?,
      last_name:                     row.get(3)?,
      phone_number:                  row.get(4)?,
      has_opted_in_to_emails:        row.get(5)?,
      has_opted_in_to_sms:           row.get(6)?,
      has_opted_in_to_membership:    row.get(7)?,
      information_visibility:        row.get(8)?,
      referral_id:                   row.get(9)?,
      acquisition_source:            row.get(10)?,
      acquisition_medium:            row.get(11)?,
      acquisition_campaign:          row.get(12)?,
      acquisition_referer:           row.get(13)?,
      primary_user_email_address_id: row.get(14)?,
      address_id:                    row.get(15)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:                            decode_uuid(&self.id)?,
      created_at:                    decode_dt(&self.created_at)?,
      first_name:                    self.first_name,
      last_name:                     self.last_name,
      phone_number:                  self.phone_number,
      has_opted_in_to_emails:        self.has_opted_in_to_emails,
      has_opted_in_to_sms:           self.has_opted_in_to_sms,
      has_opted_in_to_membership:    self.has_opted_in_to_membership,
      information_visibility:        InformationVisibility::from_discriminant(
        &self.information_visibility,
      )?,
      referral_id:                   self.referral_id,
      attribution:                   Attribution {
        source:   self.acquisition_source,
        medium:   self.acquisition_medium,
        campaign: self.acquisition_campaign,
        referer:  self.acquisition_referer,
      },
      primary_user_email_address_id: decode_opt_uuid(
        self.primary_user_email_address_id.as_deref(),
      )?,
      address_id:                    decode_opt_uuid(self.address_id.as_deref())?,
    })
  }
}

/// Raw values of a `user_email_addresses` row.
pub struct RawEmailAddress {
  pub id:            String,
  pub user_id:       String,
  pub email_address: String,
  pub is_verified:   bool,
  pub source:        String,
  pub created_at:    String,
}

impl RawEmailAddress {
  pub fn new(
    id: Uuid,
    user_id: Uuid,
    input: &NewEmailAddress,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id:            encode_uuid(id),
      user_id:       encode_uuid(user_id),
      email_address: input.email_address.clone(),
      is_verified:   input.is_verified,
      source:        input.source.discriminant().to_owned(),
      created_at:    encode_dt(created_at),
    }
  }

  /// Map a row selected with [`EMAIL_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      user_id:       row.get(1)?,
      email_address: row.get(2)?,
      is_verified:   row.get(3)?,
      source:        row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_email_address(self) -> Result<UserEmailAddress> {
    Ok(UserEmailAddress {
      id:            decode_uuid(&self.id)?,
      user_id:       decode_uuid(&self.user_id)?,
      email_address: self.email_address,
      is_verified:   self.is_verified,
      source:        EmailAddressSource::from_discriminant(&self.source)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values of a `user_sessions` row.
pub struct RawSession {
  pub id:         String,
  pub user_id:    String,
  pub created_at: String,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      user_id:    row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_session(self) -> Result<UserSession> {
    Ok(UserSession {
      id:         decode_uuid(&self.id)?,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values of an `addresses` row.
pub struct RawAddress {
  pub id:                          String,
  pub google_place_id:             Option<String>,
  pub formatted_description:       String,
  pub street_number:               String,
  pub route:                       String,
  pub subpremise:                  String,
  pub locality:                    String,
  pub administrative_area_level_1: String,
  pub administrative_area_level_2: String,
  pub postal_code:                 String,
  pub postal_code_suffix:          String,
  pub country_code:                String,
  pub created_at:                  String,
}

impl RawAddress {
  pub fn new(id: Uuid, input: NewAddress, created_at: DateTime<Utc>) -> Self {
    let c = input.components;
    Self {
      id:                          encode_uuid(id),
      google_place_id:             input.google_place_id,
      formatted_description:       input.formatted_description,
      street_number:               c.street_number,
      route:                       c.route,
      subpremise:                  c.subpremise,
      locality:                    c.locality,
      administrative_area_level_1: c.administrative_area_level_1,
      administrative_area_level_2: c.administrative_area_level_2,
      postal_code:                 c.postal_code,
      postal_code_suffix:          c.postal_code_suffix,
      country_code:                c.country_code,
      created_at:                  encode_dt(created_at),
    }
  }

  /// Map a row selected with [`ADDRESS_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                          row.get(0)?,
      google_place_id:             row.get(1)?,
      formatted_description:       row.get(2)?,
      street_number:               row.get(3)?,
      route:                       row.get(4)?,
      subpremise:                  row.get(5)?,
      locality:                    row.get(6)?,
      administrative_area_level_1: row.get(7)?,
      administrative_area_level_2: row.get(8)?,
      postal_code:                 row.get(9)?,
      postal_code_suffix:          row.get(10)?,
      country_code:                row.get(11)?,
      created_at:                  row.get(12)?,
    })
  }

  pub fn into_address(self) -> Result<Address> {
    Ok(Address {
      id:                    decode_uuid(&self.id)?,
      formatted_description: self.formatted_description,
      google_place_id:       self.google_place_id,
      components:            PartnerAddress {
        street_number:               self.street_number,
        route:                       self.route,
        subpremise:                  self.subpremise,
        locality:                    self.locality,
        administrative_area_level_1: self.administrative_area_level_1,
        administrative_area_level_2: self.administrative_area_level_2,
        postal_code:                 self.postal_code,
        postal_code_suffix:          self.postal_code_suffix,
        country_code:                self.country_code,
      },
      created_at:            decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values of a `user_actions` row.
pub struct RawAction {
  pub id:            String,
  pub user_id:       String,
  pub action_type:   String,
  pub opt_in_type:   Option<String>,
  pub campaign_name: String,
  pub created_at:    String,
}

impl RawAction {
  /// Map a row selected with [`ACTION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      user_id:       row.get(1)?,
      action_type:   row.get(2)?,
      opt_in_type:   row.get(3)?,
      campaign_name: row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_action(self) -> Result<UserAction> {
    Ok(UserAction {
      id:            decode_uuid(&self.id)?,
      user_id:       decode_uuid(&self.user_id)?,
      action_type:   ActionType::from_discriminant(&self.action_type)?,
      opt_in_type:   self
        .opt_in_type
        .as_deref()
        .map(OptInType::from_discriminant)
        .transpose()?,
      campaign_name: self.campaign_name,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// A user row together with its related rows.
pub struct RawUserRecord {
  pub user:            RawUser,
  pub email_addresses: Vec<RawEmailAddress>,
  pub sessions:        Vec<RawSession>,
  pub address:         Option<RawAddress>,
}

impl RawUserRecord {
  pub fn into_record(self) -> Result<UserRecord> {
    Ok(UserRecord {
      user:            self.user.into_user()?,
      email_addresses: self
        .email_addresses
        .into_iter()
        .map(RawEmailAddress::into_email_address)
        .collect::<Result<_>>()?,
      sessions:        self
        .sessions
        .into_iter()
        .map(RawSession::into_session)
        .collect::<Result<_>>()?,
      address:         self.address.map(RawAddress::into_address).transpose()?,
    })
  }
}
