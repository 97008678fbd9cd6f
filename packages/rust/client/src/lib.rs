//! Destination API client and media relay.
//!
//! [`ApiClient`] wraps the destination's authenticated HTTPS/JSON API with
//! rate-limit backoff, cursor pagination, and chunked bulk commits.
//! [`MediaRelay`] moves origin media into the destination, degrading to
//! direct links on failure.

mod api;
mod media;

pub use api::{API_VERSION, ApiClient, FileUploadSlot};
pub use media::{MediaRelay, RelayStats};
