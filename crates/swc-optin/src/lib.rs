//! The verified-partner opt-in flow.
//!
//! A partner tells us one of its users wants to opt in. [`OptInService`]
//! resolves (or creates) the user behind the email address, records the
//! opt-in action unless one of the same kind already exists, and on a new
//! action notifies the advocate CRM through an asynchronous event.
//!
//! ```text
//! resolve user ──► dedupe action ──► (new only) notify CRM
//! ```
//!
//! All collaborators (place lookup, event dispatch, analytics, diagnostics)
//! are passed in explicitly through [`Collaborators`].

pub mod advocate;
pub mod analytics;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod input;
pub mod locks;
pub mod notifier;
pub mod places;
pub mod referral;
mod resolver;
pub mod service;

pub use error::{Error, Result};
pub use input::{OptInInput, OptInResult, PartnerApiResponse, UserState};
pub use service::{Collaborators, OptInService, OptInSettings};
