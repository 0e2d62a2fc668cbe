//! Advocacy actions recorded against a user. Actions are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::user::discriminant_impl;

/// Campaign label every partner opt-in action is recorded under, whatever
/// campaign name the partner supplied.
pub const DEFAULT_OPT_IN_CAMPAIGN_NAME: &str = "DEFAULT";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
  OptIn,
  Call,
  Email,
  Donation,
  NftMint,
  Tweet,
}

/// Sub-kind of an [`ActionType::OptIn`] action.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OptInType {
  SwcSignUpAsSubscriber,
  SwcSignUpAsMember,
  Sms,
}

discriminant_impl!(ActionType, "action type");
discriminant_impl!(OptInType, "opt-in type");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAction {
  pub id:            Uuid,
  pub user_id:       Uuid,
  pub action_type:   ActionType,
  /// Only set for [`ActionType::OptIn`].
  pub opt_in_type:   Option<OptInType>,
  pub campaign_name: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::UserStore::create_action`].
#[derive(Debug, Clone)]
pub struct NewUserAction {
  pub user_id:       Uuid,
  pub action_type:   ActionType,
  pub opt_in_type:   Option<OptInType>,
  pub campaign_name: String,
}

impl NewUserAction {
  /// An opt-in action under the default campaign label.
  pub fn opt_in(user_id: Uuid, opt_in_type: OptInType) -> Self {
    Self {
      user_id,
      action_type: ActionType::OptIn,
      opt_in_type: Some(opt_in_type),
      campaign_name: DEFAULT_OPT_IN_CAMPAIGN_NAME.to_owned(),
    }
  }
}
