//! Server configuration, deserialised from `config.toml` layered with
//! `SWC_`-prefixed environment variables (`SWC_PORT`, `SWC_PLACES__API_KEY`).
//! [`ServerConfig::from_toml`] reads the text alone.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use swc_optin::{
  OptInSettings,
  advocate::{AdvocateCampaign, CampaignIds},
};

pub const ENV_PREFIX: &str = "SWC";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  /// Serialise concurrent opt-ins for the same email.
  #[serde(default = "default_identity_lock")]
  pub identity_lock: bool,
  #[serde(default)]
  pub partners:      Vec<PartnerConfig>,
  /// Google Places lookup; addresses are stored unresolved without it.
  pub places:        Option<PlacesConfig>,
  /// Event endpoint; events go to the log without it.
  pub events:        Option<EventsConfig>,
  #[serde(default)]
  pub campaigns:     CampaignIds,
}

/// A partner allowed to call the API.
#[derive(Debug, Clone, Deserialize)]
pub struct PartnerConfig {
  pub name:         String,
  /// Argon2 PHC string of the partner's API key.
  pub api_key_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacesConfig {
  pub api_key:  String,
  pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
  pub base_url:  String,
  pub event_key: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("swc.sqlite3") }

fn default_identity_lock() -> bool { true }

impl ServerConfig {
  /// Read `path` (optional) and the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(environment())
      .build()?
      .try_deserialize()
  }

  /// Parse TOML text alone; the process environment is not consulted.
  pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(toml_source(toml))
      .build()?
      .try_deserialize()
  }

  pub fn opt_in_settings(&self) -> OptInSettings {
    OptInSettings {
      identity_lock:        self.identity_lock,
      advocate_campaign_id: self
        .campaigns
        .get(AdvocateCampaign::OneClickNativeSubscriber),
    }
  }
}

fn environment() -> config::Environment {
  config::Environment::with_prefix(ENV_PREFIX)
    .prefix_separator("_")
    .separator("__")
}

fn toml_source(toml: &str) -> config::File<config::FileSourceString, config::FileFormat> {
  config::File::from_str(toml, config::FileFormat::Toml)
}
