//! Media relay: move embedded images from the origin into the destination.
//!
//! Each image flagged for relay is downloaded, granted an upload slot, and
//! streamed to it; the block is then rewritten to reference the uploaded
//! object. Any step failure degrades the block to a direct external link;
//! a missing image never fails the item.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use bookport_blocks::{Block, MediaRef};
use bookport_shared::{BookportError, Result};

use crate::api::ApiClient;

/// Delay between relayed images, sharing the destination's rate budget.
const RELAY_DELAY: Duration = Duration::from_millis(500);

/// Extensions accepted as-is; anything else falls back to png.
const KNOWN_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Outcome counters for one relay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Images now referencing an uploaded object.
    pub uploaded: usize,
    /// Images degraded to a direct external link.
    pub linked: usize,
}

/// Downloads origin media and re-uploads it to the destination.
pub struct MediaRelay<'a> {
    api: &'a ApiClient,
    http: Client,
    delay: Duration,
}

impl<'a> MediaRelay<'a> {
    pub fn new(api: &'a ApiClient) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("bookport/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BookportError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api,
            http,
            delay: RELAY_DELAY,
        })
    }

    /// Override the inter-item delay (tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Resolve every pending media reference in `blocks`, recursing into
    /// container children. Never fails: each image either uploads or
    /// degrades to an external link.
    pub async fn relay_blocks(&self, blocks: &mut [Block]) -> RelayStats {
        let mut stats = RelayStats::default();
        self.relay_level(blocks, &mut stats).await;
        stats
    }

    fn relay_level<'b>(
        &'b self,
        blocks: &'b mut [Block],
        stats: &'b mut RelayStats,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'b>> {
        Box::pin(async move {
            for block in blocks.iter_mut() {
                if let Block::Image { media } = block {
                    if let MediaRef::Pending {
                        original_url,
                        needs_relay,
                    } = media.clone()
                    {
                        if !needs_relay {
                            *media = MediaRef::External { url: original_url };
                            continue;
                        }

                        match self.relay_one(&original_url).await {
                            Ok(file_id) => {
                                debug!(url = %original_url, %file_id, "media relayed");
                                *media = MediaRef::Uploaded { file_id };
                                stats.uploaded += 1;
                            }
                            Err(e) => {
                                warn!(url = %original_url, error = %e, "relay failed, linking original");
                                *media = MediaRef::External { url: original_url };
                                stats.linked += 1;
                            }
                        }

                        tokio::time::sleep(self.delay).await;
                    }
                }

                if let Some(children) = block.children_mut() {
                    self.relay_level(children, stats).await;
                }
            }
        })
    }

    /// Download one image and stream it to a fresh upload slot.
    async fn relay_one(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BookportError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookportError::Network(format!("{url}: HTTP {status}")));
        }

        let header_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BookportError::Network(format!("{url}: body read failed: {e}")))?;

        let ext = extension_for(url);
        let content_type = header_type.unwrap_or_else(|| format!("image/{ext}"));
        let filename = format!("{}.{ext}", short_hash(url));

        let slot = self.api.create_file_upload(&filename, &content_type).await?;
        self.api
            .send_file_upload(&slot, bytes.to_vec(), &content_type, &filename)
            .await?;

        Ok(slot.id)
    }
}

/// File extension inferred from the URL path, defaulting to png.
fn extension_for(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    if KNOWN_EXTENSIONS.contains(&ext.as_str()) {
        ext
    } else {
        "png".to_string()
    }
}

/// Deterministic short name for an origin URL.
fn short_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
