//! Diagnostic capture for situations worth a human look that are not errors.

use tracing::warn;

pub trait Diagnostics: Send + Sync {
  fn capture_message(&self, message: &str, tags: &[(&'static str, String)]);
}

/// Logs captured messages at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
  fn capture_message(&self, message: &str, tags: &[(&'static str, String)]) {
    let tags = tags
      .iter()
      .map(|(k, v)| format!("{k}={v}"))
      .collect::<Vec<_>>()
      .join(" ");
    warn!(target: "swc::diagnostics", %tags, "{message}");
  }
}
