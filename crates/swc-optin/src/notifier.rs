//! Notifies the advocate CRM of newly opted-in users.

use std::sync::Arc;

use swc_core::user::UserRecord;
use tracing::{error, info};

use crate::{
  advocate::{
    AdvocateOptions, AdvocateUser, UPSERT_ADVOCATE_EVENT_NAME,
    UpsertAdvocatePayload,
  },
  events::{DispatchError, Event, EventDispatcher},
};

#[derive(Clone)]
pub struct Notifier {
  events:      Arc<dyn EventDispatcher>,
  campaign_id: u64,
}

impl Notifier {
  pub fn new(events: Arc<dyn EventDispatcher>, campaign_id: u64) -> Self {
    Self { events, campaign_id }
  }

  pub fn payload(&self, record: &UserRecord, sms_opt_in: bool) -> UpsertAdvocatePayload {
    UpsertAdvocatePayload {
      campaign_id:        self.campaign_id,
      user:               AdvocateUser {
        user:        record.user.clone(),
        address:     record.address.clone(),
        advocate_id: None,
      },
      user_email_address: record.primary_email().cloned(),
      opts:               AdvocateOptions {
        is_email_optin: true,
        is_sms_optin: sms_opt_in,
        should_send_sms_optin_confirmation: false,
        ..Default::default()
      },
      metadata:           None,
    }
  }

  async fn dispatch(&self, payload: &UpsertAdvocatePayload) -> Result<(), DispatchError> {
    let data = serde_json::to_value(payload)?;
    self
      .events
      .send(Event {
        name: UPSERT_ADVOCATE_EVENT_NAME.to_owned(),
        data,
      })
      .await
  }

  /// Emit the upsert event for a new opt-in. Dispatch failures are logged;
  /// delivery retries belong to the event system.
  pub async fn notify_new_opt_in(&self, record: &UserRecord, sms_opt_in: bool) {
    let payload = self.payload(record, sms_opt_in);
    match self.dispatch(&payload).await {
      Ok(()) => info!(user_id = %record.user.id, "queued advocate upsert"),
      Err(e) => error!(
        user_id = %record.user.id,
        error = %e,
        "failed to queue advocate upsert"
      ),
    }
  }
}
