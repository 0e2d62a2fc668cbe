//! The opt-in service: resolve, deduplicate, record, notify.

use std::sync::Arc;

use swc_core::{
  action::{ActionType, NewUserAction},
  email::email_fingerprint,
  store::UserStore,
  user::UserRecord,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
  Error, OptInInput, OptInResult, PartnerApiResponse, Result,
  advocate::{AdvocateCampaign, CampaignIds},
  analytics::{
    ACTION_IGNORED_ALREADY_EXISTS, ActionProperties, Analytics,
    AnalyticsSession, TracingAnalytics,
  },
  diagnostics::{Diagnostics, TracingDiagnostics},
  events::EventDispatcher,
  input::UserState,
  locks::IdentityLocks,
  notifier::Notifier,
  places::PlaceResolver,
  resolver::resolve_user,
};

/// External systems the service talks to.
#[derive(Clone)]
pub struct Collaborators {
  pub places:      Arc<dyn PlaceResolver>,
  pub events:      Arc<dyn EventDispatcher>,
  pub analytics:   Arc<dyn Analytics>,
  pub diagnostics: Arc<dyn Diagnostics>,
}

impl Collaborators {
  /// Analytics and diagnostics go to `tracing`.
  pub fn new(places: Arc<dyn PlaceResolver>, events: Arc<dyn EventDispatcher>) -> Self {
    Self {
      places,
      events,
      analytics: Arc::new(TracingAnalytics),
      diagnostics: Arc::new(TracingDiagnostics),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptInSettings {
  /// Serialise concurrent requests for the same email.
  pub identity_lock:        bool,
  /// Advocate CRM campaign new opt-ins are upserted into.
  pub advocate_campaign_id: u64,
}

impl Default for OptInSettings {
  fn default() -> Self {
    Self {
      identity_lock:        true,
      advocate_campaign_id: CampaignIds::default()
        .get(AdvocateCampaign::OneClickNativeSubscriber),
    }
  }
}

pub struct OptInService<S> {
  store:       Arc<S>,
  places:      Arc<dyn PlaceResolver>,
  notifier:    Notifier,
  analytics:   Arc<dyn Analytics>,
  diagnostics: Arc<dyn Diagnostics>,
  locks:       Option<IdentityLocks>,
}

impl<S> Clone for OptInService<S> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      places:      self.places.clone(),
      notifier:    self.notifier.clone(),
      analytics:   self.analytics.clone(),
      diagnostics: self.diagnostics.clone(),
      locks:       self.locks.clone(),
    }
  }
}

impl<S: UserStore> OptInService<S> {
  pub fn new(store: Arc<S>, collaborators: Collaborators, settings: OptInSettings) -> Self {
    Self {
      store,
      places: collaborators.places,
      notifier: Notifier::new(collaborators.events, settings.advocate_campaign_id),
      analytics: collaborators.analytics,
      diagnostics: collaborators.diagnostics,
      locks: settings.identity_lock.then(IdentityLocks::new),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Record an opt-in of `input.opt_in_type` for the person behind
  /// `input.email_address`.
  ///
  /// At most one opt-in action of each type is recorded per user. A repeat
  /// still backfills the user's profile and answers `existing-action` with
  /// the same user and session ids.
  #[instrument(
    skip_all,
    fields(
      partner = %input.partner,
      opt_in_type = input.opt_in_type.discriminant(),
      email = %email_fingerprint(&input.email_address),
    )
  )]
  pub async fn opt_in(&self, input: OptInInput) -> Result<PartnerApiResponse<OptInResult>> {
    let _guard = match &self.locks {
      Some(locks) => Some(locks.lock(&input.email_address).await),
      None => None,
    };

    let action_type = ActionType::OptIn;
    let existing_action = self
      .store
      .find_opt_in_action(action_type, Some(input.opt_in_type), &input.email_address)
      .await
      .map_err(Error::store)?;

    let existing_user = match &existing_action {
      Some(found) => Some(found.user.clone()),
      None => self
        .store
        .find_user_by_email(&input.email_address)
        .await
        .map_err(Error::store)?,
    };

    let resolved =
      resolve_user(self.store.as_ref(), self.places.as_ref(), existing_user, &input)
        .await?;
    let record = resolved.record;
    let user_id = record.user.id;

    let mut analytics = AnalyticsSession::new(self.analytics.as_ref(), user_id);
    if resolved.state == UserState::New {
      analytics.set_once(&record.user);
    }
    let properties = ActionProperties {
      action_type,
      opt_in_type: Some(input.opt_in_type),
      campaign_name: input.campaign_name.clone(),
      partner: input.partner.to_string(),
      user_state: resolved.state,
    };

    if existing_action.is_some() {
      self.diagnostics.capture_message(
        "verified partner opt-in action already exists",
        &[
          ("opt_in_type", input.opt_in_type.discriminant().to_owned()),
          ("action_type", action_type.discriminant().to_owned()),
          ("email", email_fingerprint(&input.email_address)),
          ("is_verified_email_address", input.is_verified_email_address.to_string()),
        ],
      );
      analytics.track_action_ignored(ACTION_IGNORED_ALREADY_EXISTS, properties);
      analytics.flush().await;

      let session_id = self.session_id(&record).await?;
      return Ok(PartnerApiResponse::opt_in(
        OptInResult::ExistingAction,
        session_id,
        user_id,
      ));
    }

    let action = self
      .store
      .create_action(NewUserAction::opt_in(user_id, input.opt_in_type))
      .await
      .map_err(Error::store)?;
    info!(%user_id, action_id = %action.id, "recorded opt-in action");

    analytics.track_action_created(properties);
    self.notifier.notify_new_opt_in(&record, input.sms_opt_in()).await;
    analytics.flush().await;

    let session_id = self.session_id(&record).await?;
    Ok(PartnerApiResponse::opt_in(
      OptInResult::NewAction,
      session_id,
      user_id,
    ))
  }

  /// The user's first session, opening one if there is none.
  async fn session_id(&self, record: &UserRecord) -> Result<Uuid> {
    if let Some(session) = record.sessions.first() {
      return Ok(session.id);
    }
    let session = self
      .store
      .create_session(record.user.id)
      .await
      .map_err(Error::store)?;
    Ok(session.id)
  }
}
