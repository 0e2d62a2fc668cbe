//! HTTP surface for verified partners.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/verified-swc-partner/user-action-opt-in` | Basic auth as the partner |
//! | `GET`  | `/health` | Unauthenticated |

pub mod auth;
pub mod config;
pub mod error;
pub mod opt_in;

pub use error::Error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use swc_core::store::UserStore;
use swc_optin::OptInService;
use tower_http::trace::TraceLayer;

use auth::PartnerCredentials;

pub const OPT_IN_PATH: &str = "/api/verified-swc-partner/user-action-opt-in";

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub service:  OptInService<S>,
  pub partners: Arc<PartnerCredentials>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      service:  self.service.clone(),
      partners: self.partners.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S>(state: AppState<S>) -> Router
where
  S: UserStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route(OPT_IN_PATH, post(opt_in::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────
