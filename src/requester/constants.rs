//! Constants for the requester module (endpoints, identification).

/// Base URL for existence probes (`HEAD {base}/{id}`).
pub const PROBE_BASE_URL: &str = "https://imgur.com";

/// Base URL for content fetches (`GET {base}/{id}.jpg`).
pub const CONTENT_BASE_URL: &str = "https://i.imgur.com";

/// File extension of fetched payloads.
pub const PAYLOAD_EXTENSION: &str = "jpg";

/// User-Agent sent by the pooled backend.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("idprobe/{version}")
}
