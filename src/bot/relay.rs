use crate::feed::types::MediaKind;
use crate::utils::format_size;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use twilight_http::Client as HttpClient;
use twilight_model::{
    http::attachment::Attachment,
    id::{marker::ChannelMarker, Id},
};

/// Discord caps attachments at 25MB for most servers.
const MAX_UPLOAD_BYTES: u64 = 25_000_000;

/// The chat surface as the pipeline sees it: plain text messages and native
/// media attachments, addressed by channel id.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    async fn send_text(&self, channel: u64, text: &str) -> Result<()>;

    async fn send_media(
        &self,
        channel: u64,
        data: Vec<u8>,
        kind: MediaKind,
        caption: &str,
    ) -> Result<()>;
}

pub struct DiscordRelay {
    http: Arc<HttpClient>,
}

impl DiscordRelay {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatRelay for DiscordRelay {
    async fn send_text(&self, channel: u64, text: &str) -> Result<()> {
        self.http
            .create_message(Id::<ChannelMarker>::new(channel))
            .content(text)
            .await?;
        Ok(())
    }

    async fn send_media(
        &self,
        channel: u64,
        data: Vec<u8>,
        kind: MediaKind,
        caption: &str,
    ) -> Result<()> {
        let size = data.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            self.http
                .create_message(Id::<ChannelMarker>::new(channel))
                .content(&format!(
                    "Media is too large to upload ({}), the Discord limit is {}.",
                    format_size(size),
                    format_size(MAX_UPLOAD_BYTES)
                ))
                .await?;
            return Ok(());
        }

        let filename = match kind {
            MediaKind::Video => "media.mp4",
            _ => "media.jpg",
        };
        let attachment = Attachment::from_bytes(
            filename.to_string(),
            data,
            SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
        );

        self.http
            .create_message(Id::<ChannelMarker>::new(channel))
            .content(caption)
            .attachments(&[attachment])
            .await?;

        Ok(())
    }
}
