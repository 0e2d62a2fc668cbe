//! Product analytics.
//!
//! Events are buffered per request in an [`AnalyticsSession`] and handed to
//! the [`Analytics`] sink in one batch on [`AnalyticsSession::flush`]. A failed
//! flush is logged; it never fails the request.

use async_trait::async_trait;
use serde::Serialize;
use swc_core::{
  action::{ActionType, OptInType},
  user::User,
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

pub const ACTION_IGNORED_ALREADY_EXISTS: &str = "Already Exists";

#[derive(Debug, Error)]
pub enum AnalyticsError {
  #[error("analytics sink unavailable: {0}")]
  Unavailable(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Persisted user properties, recorded once when a user is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleProperties {
  pub first_name:                 Option<String>,
  pub last_name:                  Option<String>,
  pub has_opted_in_to_emails:     bool,
  pub has_opted_in_to_sms:        bool,
  pub has_opted_in_to_membership: bool,
  pub acquisition_source:         String,
  pub acquisition_medium:         String,
  pub acquisition_campaign:       String,
}

impl From<&User> for PeopleProperties {
  fn from(user: &User) -> Self {
    Self {
      first_name:                 user.first_name.clone(),
      last_name:                  user.last_name.clone(),
      has_opted_in_to_emails:     user.has_opted_in_to_emails,
      has_opted_in_to_sms:        user.has_opted_in_to_sms,
      has_opted_in_to_membership: user.has_opted_in_to_membership,
      acquisition_source:         user.attribution.source.clone(),
      acquisition_medium:         user.attribution.medium.clone(),
      acquisition_campaign:       user.attribution.campaign.clone(),
    }
  }
}

/// Properties common to both action events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionProperties {
  pub action_type:   ActionType,
  pub opt_in_type:   Option<OptInType>,
  pub campaign_name: String,
  pub partner:       String,
  pub user_state:    crate::UserState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
  SetOnce {
    distinct_id: Uuid,
    properties:  PeopleProperties,
  },
  ActionCreated {
    distinct_id: Uuid,
    #[serde(flatten)]
    properties:  ActionProperties,
  },
  ActionIgnored {
    distinct_id: Uuid,
    reason:      String,
    #[serde(flatten)]
    properties:  ActionProperties,
  },
}

#[async_trait]
pub trait Analytics: Send + Sync {
  async fn track(&self, events: Vec<AnalyticsEvent>) -> Result<(), AnalyticsError>;
}

/// Emits each event as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

#[async_trait]
impl Analytics for TracingAnalytics {
  async fn track(&self, events: Vec<AnalyticsEvent>) -> Result<(), AnalyticsError> {
    for event in events {
      let body = serde_json::to_string(&event)?;
      info!(target: "swc::analytics", event = %body, "analytics event");
    }
    Ok(())
  }
}

/// Per-request buffer of analytics events for one user.
pub struct AnalyticsSession<'a> {
  sink:        &'a dyn Analytics,
  distinct_id: Uuid,
  pending:     Vec<AnalyticsEvent>,
}

impl<'a> AnalyticsSession<'a> {
  pub fn new(sink: &'a dyn Analytics, distinct_id: Uuid) -> Self {
    Self {
      sink,
      distinct_id,
      pending: Vec::new(),
    }
  }

  pub fn set_once(&mut self, user: &User) {
    self.pending.push(AnalyticsEvent::SetOnce {
      distinct_id: self.distinct_id,
      properties:  user.into(),
    });
  }

  pub fn track_action_created(&mut self, properties: ActionProperties) {
    self.pending.push(AnalyticsEvent::ActionCreated {
      distinct_id: self.distinct_id,
      properties,
    });
  }

  pub fn track_action_ignored(&mut self, reason: &str, properties: ActionProperties) {
    self.pending.push(AnalyticsEvent::ActionIgnored {
      distinct_id: self.distinct_id,
      reason: reason.to_owned(),
      properties,
    });
  }

  pub fn pending(&self) -> &[AnalyticsEvent] { &self.pending }

  /// Send everything buffered so far.
  pub async fn flush(&mut self) {
    if self.pending.is_empty() {
      return;
    }
    let events = std::mem::take(&mut self.pending);
    let count = events.len();
    if let Err(e) = self.sink.track(events).await {
      error!(error = %e, count, "failed to flush analytics events");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::UserState;

  #[test]
  fn action_ignored_serialises_reason_and_flattened_properties() {
    let id = Uuid::nil();
    let event = AnalyticsEvent::ActionIgnored {
      distinct_id: id,
      reason:      ACTION_IGNORED_ALREADY_EXISTS.into(),
      properties:  ActionProperties {
        action_type:   ActionType::OptIn,
        opt_in_type:   Some(OptInType::Sms),
        campaign_name: "c1".into(),
        partner:       "coinbase".into(),
        user_state:    UserState::Existing,
      },
    };

    let body = serde_json::to_value(&event).unwrap();
    assert_eq!(body["event"], "action_ignored");
    assert_eq!(body["reason"], "Already Exists");
    assert_eq!(body["actionType"], "OPT_IN");
    assert_eq!(body["optInType"], "SMS");
    assert_eq!(body["userState"], "Existing");
  }

  #[tokio::test]
  async fn flush_drains_the_buffer() {
    let sink = TracingAnalytics;
    let mut session = AnalyticsSession::new(&sink, Uuid::nil());
    session.track_action_created(ActionProperties {
      action_type:   ActionType::OptIn,
      opt_in_type:   None,
      campaign_name: "c1".into(),
      partner:       "coinbase".into(),
      user_state:    UserState::New,
    });
    assert_eq!(session.pending().len(), 1);
    session.flush().await;
    assert!(session.pending().is_empty());
  }
}
