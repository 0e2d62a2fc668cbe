//! Resolve the user behind an opt-in, creating or backfilling as needed.

use swc_core::{
  address::{NewAddress, PartnerAddress},
  email::email_fingerprint,
  patch::UserPatch,
  store::UserStore,
  user::{InformationVisibility, NewUser, UserRecord},
};
use tracing::{error, info};

use crate::{
  Error, OptInInput, Result, UserState, places::PlaceResolver,
  referral::generate_referral_id,
};

pub(crate) struct ResolvedUser {
  pub record: UserRecord,
  pub state:  UserState,
}

/// Storable form of a partner address. The place lookup is best-effort.
pub(crate) async fn resolve_address(
  places: &dyn PlaceResolver,
  address: &PartnerAddress,
) -> NewAddress {
  let lookup = address.formatted_description(false);
  let place_id = match places.resolve_place_id(&lookup).await {
    Ok(id) => Some(id),
    Err(e) => {
      error!(error = %e, "error getting google place id");
      None
    }
  };
  address.clone().into_new_address(place_id)
}

pub(crate) async fn resolve_user<S: UserStore>(
  store: &S,
  places: &dyn PlaceResolver,
  existing: Option<UserRecord>,
  input: &OptInInput,
) -> Result<ResolvedUser> {
  let address = match &input.address {
    Some(a) => Some(resolve_address(places, a).await),
    None => None,
  };

  match existing {
    Some(record) => update_existing(store, record, address, input).await,
    None => create(store, address, input).await,
  }
}

async fn update_existing<S: UserStore>(
  store: &S,
  mut record: UserRecord,
  address: Option<NewAddress>,
  input: &OptInInput,
) -> Result<ResolvedUser> {
  let user_id = record.user.id;
  let patch = UserPatch::plan(&record, &input.profile(), &input.email(), address);
  let mut state = UserState::Existing;

  if !patch.is_empty() {
    info!(
      %user_id,
      "updating the following user fields {}",
      patch.changed_fields().join(", ")
    );
    record = store
      .update_user(user_id, &patch)
      .await
      .map_err(Error::store)?;
    state = UserState::ExistingWithUpdates;
  }

  if record.primary_email().is_none() {
    let email_id = record
      .latest_email_matching(&input.email_address)
      .map(|e| e.id)
      .ok_or(Error::MissingRelation {
        user_id,
        relation: "email address",
      })?;
    info!(%user_id, "updating primary email");
    store
      .set_primary_email(user_id, email_id)
      .await
      .map_err(Error::store)?;
    record.user.primary_user_email_address_id = Some(email_id);
    state = UserState::ExistingWithUpdates;
  }

  Ok(ResolvedUser { record, state })
}

async fn create<S: UserStore>(
  store: &S,
  address: Option<NewAddress>,
  input: &OptInInput,
) -> Result<ResolvedUser> {
  let profile = input.profile();
  let new_user = NewUser {
    attribution: input.partner.attribution(&input.campaign_name),
    referral_id: generate_referral_id(),
    information_visibility: InformationVisibility::Anonymous,
    first_name: profile.first_name,
    last_name: profile.last_name,
    phone_number: profile.phone_number,
    has_opted_in_to_emails: true,
    has_opted_in_to_sms: profile.has_opted_in_to_sms,
    has_opted_in_to_membership: profile.has_opted_in_to_membership,
    email_address: input.email(),
    address,
  };

  let mut record = store.create_user(new_user).await.map_err(Error::store)?;
  let user_id = record.user.id;

  let email_id = record
    .latest_email_matching(&input.email_address)
    .map(|e| e.id)
    .ok_or(Error::MissingRelation {
      user_id,
      relation: "email address",
    })?;
  store
    .set_primary_email(user_id, email_id)
    .await
    .map_err(Error::store)?;
  record.user.primary_user_email_address_id = Some(email_id);

  info!(
    %user_id,
    partner = %input.partner,
    email = %email_fingerprint(&input.email_address),
    "created user for verified partner opt-in"
  );
  Ok(ResolvedUser {
    record,
    state: UserState::New,
  })
}
