//! Outbound asynchronous events.
//!
//! Sending an event hands it to an external event system, which owns
//! delivery and retries. Nothing here retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// A named event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub name: String,
  pub data: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("event channel is closed")]
  Closed,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait EventDispatcher: Send + Sync {
  async fn send(&self, event: Event) -> Result<(), DispatchError>;
}

/// Posts events to an Inngest-compatible HTTP endpoint
/// (`{base_url}/e/{event_key}`).
#[derive(Debug, Clone)]
pub struct HttpEventDispatcher {
  client: reqwest::Client,
  url:    String,
}

impl HttpEventDispatcher {
  pub fn new(base_url: &str, event_key: &str) -> Self {
    Self {
      client: reqwest::Client::new(),
      url:    format!("{}/e/{event_key}", base_url.trim_end_matches('/')),
    }
  }
}

#[async_trait]
impl EventDispatcher for HttpEventDispatcher {
  async fn send(&self, event: Event) -> Result<(), DispatchError> {
    self
      .client
      .post(&self.url)
      .json(&event)
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }
}

/// Hands events to an in-process consumer over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
  tx: mpsc::UnboundedSender<Event>,
}

impl ChannelDispatcher {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

#[async_trait]
impl EventDispatcher for ChannelDispatcher {
  async fn send(&self, event: Event) -> Result<(), DispatchError> {
    self.tx.send(event).map_err(|_| DispatchError::Closed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn channel_dispatcher_delivers_in_order() {
    let (dispatcher, mut rx) = ChannelDispatcher::new();
    for n in 0..3 {
      dispatcher
        .send(Event { name: "test".into(), data: serde_json::json!(n) })
        .await
        .unwrap();
    }
    for n in 0..3 {
      assert_eq!(rx.recv().await.unwrap().data, serde_json::json!(n));
    }
  }

  #[tokio::test]
  async fn channel_dispatcher_reports_closed_receiver() {
    let (dispatcher, rx) = ChannelDispatcher::new();
    drop(rx);
    let err = dispatcher
      .send(Event { name: "test".into(), data: serde_json::Value::Null })
      .await
      .unwrap_err();
    assert!(matches!(err, DispatchError::Closed));
  }

  #[test]
  fn http_dispatcher_builds_event_url() {
    let d = HttpEventDispatcher::new("https://inn.gs/", "key123");
    assert_eq!(d.url, "https://inn.gs/e/key123");
  }
}
