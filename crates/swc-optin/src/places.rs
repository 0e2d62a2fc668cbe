//! Resolution of postal addresses to external place identifiers.
//!
//! Place ids let users at the same address share one address row. Lookup is
//! best-effort: callers log failures and store the address unresolved.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaceError {
  #[error("place lookup is not configured")]
  Disabled,

  #[error("no place matched {0:?}")]
  NotFound(String),

  #[error("place lookup returned status {0}")]
  Status(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait PlaceResolver: Send + Sync {
  /// Resolve a single-line address description to a place id.
  async fn resolve_place_id(&self, description: &str) -> Result<String, PlaceError>;
}

/// A resolver that never resolves anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPlaceResolver;

#[async_trait]
impl PlaceResolver for DisabledPlaceResolver {
  async fn resolve_place_id(&self, _description: &str) -> Result<String, PlaceError> {
    Err(PlaceError::Disabled)
  }
}

pub const GOOGLE_PLACES_BASE_URL: &str = "https://maps.googleapis.com";

/// Google Places "find place from text".
#[derive(Debug, Clone)]
pub struct GooglePlacesResolver {
  client:   reqwest::Client,
  base_url: String,
  api_key:  String,
}

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
  status:     String,
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  place_id: String,
}

impl GooglePlacesResolver {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self::with_base_url(api_key, GOOGLE_PLACES_BASE_URL)
  }

  pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
    Self {
      client:   reqwest::Client::new(),
      base_url: base_url.into(),
      api_key:  api_key.into(),
    }
  }
}

#[async_trait]
impl PlaceResolver for GooglePlacesResolver {
  async fn resolve_place_id(&self, description: &str) -> Result<String, PlaceError> {
    let url = format!(
      "{}/maps/api/place/findplacefromtext/json",
      self.base_url.trim_end_matches('/')
    );

    let response: FindPlaceResponse = self
      .client
      .get(url)
      .query(&[
        ("input", description),
        ("inputtype", "textquery"),
        ("fields", "place_id"),
        ("key", self.api_key.as_str()),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    match response.status.as_str() {
      "OK" => response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.place_id)
        .ok_or_else(|| PlaceError::NotFound(description.to_owned())),
      "ZERO_RESULTS" => Err(PlaceError::NotFound(description.to_owned())),
      other => Err(PlaceError::Status(other.to_owned())),
    }
  }
}
