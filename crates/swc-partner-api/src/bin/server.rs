//! swc-partner-api server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SWC_*` environment variables, opens the SQLite store, and serves the
//! verified-partner API over HTTP.
//!
//! # API key hash generation
//!
//! To generate the argon2 PHC string for a partner's `api_key_hash`:
//!
//! ```text
//! cargo run -p swc-partner-api --bin server -- --hash-api-key
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use swc_optin::{
  Collaborators, OptInService,
  events::{ChannelDispatcher, EventDispatcher, HttpEventDispatcher},
  places::{DisabledPlaceResolver, GooglePlacesResolver, PlaceResolver},
};
use swc_partner_api::{AppState, auth::PartnerCredentials, config::ServerConfig};
use swc_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Stand With Crypto verified-partner API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for an API key entered on stdin and exit.
  #[arg(long)]
  hash_api_key: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_api_key {
    let api_key = read_secret()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(api_key.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg =
    ServerConfig::load(&cli.config).context("failed to load configuration")?;
  if server_cfg.partners.is_empty() {
    warn!("no partners configured; every opt-in request will be rejected");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let places: Arc<dyn PlaceResolver> = match &server_cfg.places {
    Some(p) => match &p.base_url {
      Some(base_url) => {
        Arc::new(GooglePlacesResolver::with_base_url(&p.api_key, base_url))
      }
      None => Arc::new(GooglePlacesResolver::new(&p.api_key)),
    },
    None => {
      info!("place lookup disabled");
      Arc::new(DisabledPlaceResolver)
    }
  };

  let events: Arc<dyn EventDispatcher> = match &server_cfg.events {
    Some(e) => Arc::new(HttpEventDispatcher::new(&e.base_url, &e.event_key)),
    None => {
      info!("no event endpoint configured; logging events instead");
      let (dispatcher, mut rx) = ChannelDispatcher::new();
      tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
          info!(name = %event.name, data = %event.data, "event");
        }
      });
      Arc::new(dispatcher)
    }
  };

  let state = AppState {
    service:  OptInService::new(
      Arc::new(store),
      Collaborators::new(places, events),
      server_cfg.opt_in_settings(),
    ),
    partners: Arc::new(PartnerCredentials::new(&server_cfg.partners)),
  };

  let app = swc_partner_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a secret from stdin.
fn read_secret() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("API key: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
