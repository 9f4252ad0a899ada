mod entities;
mod fetch;
mod ocr;
mod variant;

pub use entities::{resolve, ResolvedSet};
pub use fetch::{Fetcher, HttpFetcher, RetrieveError, RetrievedMedia};
pub use ocr::{Ocr, OcrError, TesseractOcr};
pub use variant::{select_url, VIDEO_CONTENT_TYPE};

use crate::bot::relay::ChatRelay;
use crate::feed::types::{MediaKind, Post};
use crate::utils::format_size;
use anyhow::Result;
use tracing::{debug, info, warn};

/// What happened to the one media item the pipeline attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The bytes went out as a native attachment.
    Delivered { kind: MediaKind, bytes: u64 },
    /// Retrieval failed, so the bare URL went out as text with the reason.
    DeliveredAsLink { url: String, reason: String },
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaySummary {
    Relayed(RelayOutcome),
    NoMedia,
    NoneDeliverable { total: usize },
}

/// Resolves a post's media, retrieves the first usable item, and relays it to
/// the chat surface, degrading failures to text fallbacks so the surrounding
/// command always completes.
pub struct RelayPipeline {
    fetcher: Box<dyn Fetcher>,
    ocr: Box<dyn Ocr>,
}

impl RelayPipeline {
    pub fn new() -> Result<Self> {
        Ok(Self::with_parts(
            Box::new(HttpFetcher::new()?),
            Box::new(TesseractOcr::new()),
        ))
    }

    pub fn with_parts(fetcher: Box<dyn Fetcher>, ocr: Box<dyn Ocr>) -> Self {
        Self { fetcher, ocr }
    }

    pub async fn test_setup(&self) -> Result<()> {
        if TesseractOcr::test_availability().await {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "tesseract is not available, image text extraction will fail"
            ))
        }
    }

    /// Relays the post's media to the given channel.
    ///
    /// Intentionally best-effort, first success: items are tried in source
    /// order and the first one that yields any outcome (delivery or link
    /// fallback) ends the run. Items with no retrievable URL are skipped.
    pub async fn relay_media(
        &self,
        relay: &dyn ChatRelay,
        channel: u64,
        post: &Post,
    ) -> Result<RelaySummary> {
        let Some(set) = resolve(post.entities.as_ref(), post.extended_entities.as_ref()) else {
            relay
                .send_text(channel, "This post has no media attached.")
                .await?;
            return Ok(RelaySummary::NoMedia);
        };

        info!(
            "Post {} carries {} media item(s), extended: {}",
            post.id,
            set.items.len(),
            set.extended
        );
        let suffix = if set.extended {
            " in the extended set"
        } else {
            ""
        };
        relay
            .send_text(
                channel,
                &format!("Found {} media item(s){}.", set.items.len(), suffix),
            )
            .await?;

        for item in set.items {
            let Some(url) = select_url(item) else {
                debug!("Skipping {} item with no retrievable URL", item.kind.label());
                continue;
            };
            let outcome = self.deliver(relay, channel, item.kind, url).await?;
            return Ok(RelaySummary::Relayed(outcome));
        }

        relay
            .send_text(
                channel,
                &format!(
                    "0 of {} media item(s) could be delivered in a supported format.",
                    set.items.len()
                ),
            )
            .await?;
        Ok(RelaySummary::NoneDeliverable {
            total: set.items.len(),
        })
    }

    async fn deliver(
        &self,
        relay: &dyn ChatRelay,
        channel: u64,
        kind: MediaKind,
        url: &str,
    ) -> Result<RelayOutcome> {
        let media = match self.fetcher.fetch(url, kind).await {
            Ok(media) => media,
            Err(e) => {
                warn!("Failed to retrieve {}: {}", url, e);
                relay
                    .send_text(channel, &link_fallback_text(kind, url, &e.to_string()))
                    .await?;
                return Ok(RelayOutcome::DeliveredAsLink {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        info!(
            "Retrieved {} ({}) to {}",
            url,
            format_size(media.size),
            media.path().display()
        );

        let data = match media.read() {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "Could not read back spooled media {}: {}",
                    media.path().display(),
                    e
                );
                relay
                    .send_text(channel, &link_fallback_text(kind, url, &e.to_string()))
                    .await?;
                return Ok(RelayOutcome::DeliveredAsLink {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let caption = format!("{} ({})", kind.label(), format_size(media.size));
        relay.send_media(channel, data, kind, &caption).await?;

        if kind == MediaKind::Photo {
            match self.ocr.recognize(media.path()).await {
                Ok(text) => {
                    relay
                        .send_text(channel, &format!("Image text: {}", text.trim()))
                        .await?;
                }
                Err(e) => {
                    warn!(
                        "Text extraction failed for {}: {}",
                        media.path().display(),
                        e
                    );
                    relay
                        .send_text(
                            channel,
                            &format!("Could not extract text from the image: {e}"),
                        )
                        .await?;
                }
            }
        }

        // `media` drops here on every path, removing the spooled file.
        Ok(RelayOutcome::Delivered {
            kind: media.kind,
            bytes: media.size,
        })
    }
}

fn link_fallback_text(kind: MediaKind, url: &str, reason: &str) -> String {
    format!(
        "Could not fetch the {}, here is the link instead: {} ({})",
        kind.label(),
        url,
        reason
    )
}
