//! The `UserStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `swc-store-sqlite`).
//! The opt-in service and the partner API depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  action::{ActionType, NewUserAction, OptInType, UserAction},
  patch::UserPatch,
  user::{NewUser, UserRecord, UserSession},
};

/// An action found by [`UserStore::find_opt_in_action`], with its owner.
#[derive(Debug, Clone)]
pub struct ExistingAction {
  pub action: UserAction,
  pub user:   UserRecord,
}

/// Abstraction over a user store backend.
///
/// Nothing here enforces one opt-in action per user and kind; callers look
/// before they insert.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Lookups ───────────────────────────────────────────────────────────

  /// The oldest action of `action_type` / `opt_in_type` owned by a user who
  /// has `email_address` among their email addresses.
  fn find_opt_in_action<'a>(
    &'a self,
    action_type: ActionType,
    opt_in_type: Option<OptInType>,
    email_address: &'a str,
  ) -> impl Future<Output = Result<Option<ExistingAction>, Self::Error>> + Send + 'a;

  /// The oldest user owning `email_address`, if any.
  fn find_user_by_email<'a>(
    &'a self,
    email_address: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  /// Retrieve a user and its relations by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user with its first email address and one session, connecting
  /// or creating the address if one is given.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + '_;

  /// Apply every populated field of `patch` to the user in one transaction.
  fn update_user<'a>(
    &'a self,
    id: Uuid,
    patch: &'a UserPatch,
  ) -> impl Future<Output = Result<UserRecord, Self::Error>> + Send + 'a;

  /// Point the user's primary email at `email_address_id`, which must belong
  /// to the user.
  fn set_primary_email(
    &self,
    user_id: Uuid,
    email_address_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Actions & sessions ────────────────────────────────────────────────

  /// Append an action. The store sets `id` and `created_at`.
  fn create_action(
    &self,
    input: NewUserAction,
  ) -> impl Future<Output = Result<UserAction, Self::Error>> + Send + '_;

  /// All actions of a user, oldest first.
  fn list_actions(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserAction>, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<UserSession, Self::Error>> + Send + '_;
}
