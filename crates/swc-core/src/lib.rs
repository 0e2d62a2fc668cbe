//! Core types and trait definitions for the Stand With Crypto opt-in flow.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend, the opt-in service and the partner API all depend on it.

pub mod action;
pub mod address;
pub mod email;
pub mod error;
pub mod partner;
pub mod patch;
pub mod phone;
pub mod store;
pub mod user;

pub use error::{Error, Result};
