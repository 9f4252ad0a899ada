use crate::bot::relay::{ChatRelay, DiscordRelay};
use crate::config::Config;
use crate::feed::FeedClient;
use crate::media::RelayPipeline;
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use twilight_cache_inmemory::InMemoryCache;
use twilight_gateway::{Event, EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::payload::incoming::MessageCreate;

const COMMAND_PREFIX: char = '!';
const GET_USAGE: &str = "Usage: !get <post-id>";

#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("expected exactly one argument, got {0}")]
    WrongArgCount(usize),
    #[error("post id is not an integer: {0}")]
    NotAnInteger(String),
}

pub struct DiscordBot {
    http: Arc<HttpClient>,
    cache: InMemoryCache,
    shard: Shard,
    pipeline: RelayPipeline,
    config: Config,
    feed: Option<FeedClient>,
}

impl DiscordBot {
    pub async fn new(token: String, config: Config) -> Result<Self> {
        let http = Arc::new(HttpClient::new(token.clone()));
        let cache = InMemoryCache::new();

        let intents = Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;
        let shard = Shard::new(ShardId::ONE, token, intents);

        let pipeline = RelayPipeline::new().context("Failed to initialize the relay pipeline")?;

        // The bot still starts without OCR; photo commands will report the
        // extraction failure instead.
        if let Err(e) = pipeline.test_setup().await {
            warn!("Relay pipeline test failed: {}", e);
        }

        Ok(Self {
            http,
            cache,
            shard,
            pipeline,
            config,
            feed: None,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        info!("Discord bot starting...");

        loop {
            let event = match self
                .shard
                .next_event(EventTypeFlags::all())
                .await
            {
                Some(Ok(event)) => event,
                Some(Err(source)) => {
                    error!(?source, "Error receiving event");
                    continue;
                }
                None => {
                    info!("Shard stream ended");
                    return Ok(());
                }
            };

            self.cache.update(&event);

            match event {
                Event::MessageCreate(msg) => {
                    if let Err(e) = self.handle_message(&msg).await {
                        error!("Command handling failed: {:#}", e);
                    }
                }
                Event::Ready(_) => {
                    info!("Discord bot is ready!");
                }
                _ => {}
            }
        }
    }

    async fn handle_message(&mut self, msg: &MessageCreate) -> Result<()> {
        // Skip bot messages
        if msg.author.bot {
            return Ok(());
        }

        let Some(rest) = msg.content.trim().strip_prefix(COMMAND_PREFIX) else {
            return Ok(());
        };
        let mut parts = rest.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(());
        };
        let args: Vec<&str> = parts.collect();

        if !self.config.is_authorized(msg.author.id.get()) {
            debug!("Ignoring command from unauthorized user {}", msg.author.id);
            return Ok(());
        }

        let relay = DiscordRelay::new(Arc::clone(&self.http));
        let channel = msg.channel_id.get();

        match name {
            "start" => {
                relay
                    .send_text(
                        channel,
                        "Hi! I relay posts from the feed. Use !get <post-id> to fetch one.",
                    )
                    .await
            }
            "connect" => self.connect_feed(&relay, channel).await,
            "timeline" => self.handle_timeline(&relay, channel).await,
            "get" => self.handle_get(&relay, channel, &args).await,
            _ => {
                debug!("Unknown command: {}", name);
                Ok(())
            }
        }
    }

    async fn connect_feed(&mut self, relay: &DiscordRelay, channel: u64) -> Result<()> {
        match FeedClient::connect(&self.config.feed).await {
            Ok(client) => {
                self.feed = Some(client);
                relay.send_text(channel, "Connected to the feed API.").await
            }
            Err(e) => {
                warn!("Feed authentication failed: {}", e);
                self.feed = None;
                relay
                    .send_text(channel, &format!("Feed authentication failed: {e}"))
                    .await
            }
        }
    }

    async fn ensure_feed(&mut self, relay: &DiscordRelay, channel: u64) -> Result<bool> {
        if self.feed.is_some() {
            return Ok(true);
        }

        relay
            .send_text(channel, "The feed is not connected, connecting now.")
            .await?;
        self.connect_feed(relay, channel).await?;
        Ok(self.feed.is_some())
    }

    async fn handle_timeline(&mut self, relay: &DiscordRelay, channel: u64) -> Result<()> {
        if !self.ensure_feed(relay, channel).await? {
            return Ok(());
        }
        let Some(feed) = self.feed.as_ref() else {
            return Ok(());
        };

        match feed.home_timeline(5).await {
            Ok(posts) => {
                for post in posts {
                    relay
                        .send_text(channel, &format!("From {}: {}", post.user.name, post.text))
                        .await?;
                }
                Ok(())
            }
            Err(e) => {
                warn!("Timeline fetch failed: {}", e);
                relay
                    .send_text(channel, &format!("Could not fetch the timeline: {e}"))
                    .await
            }
        }
    }

    async fn handle_get(&mut self, relay: &DiscordRelay, channel: u64, args: &[&str]) -> Result<()> {
        let id = match parse_post_id(args) {
            Ok(id) => id,
            Err(e) => {
                debug!("Rejected get command: {}", e);
                return relay.send_text(channel, GET_USAGE).await;
            }
        };

        if !self.ensure_feed(relay, channel).await? {
            return Ok(());
        }
        let Some(feed) = self.feed.as_ref() else {
            return Ok(());
        };

        let post = match feed.get_post(id).await {
            Ok(post) => post,
            Err(e) => {
                warn!("Post {} lookup failed: {}", id, e);
                return relay
                    .send_text(channel, &format!("Could not fetch post {id}: {e}"))
                    .await;
            }
        };

        info!("Fetched post {} by {}", post.id, post.user.name);
        relay
            .send_text(channel, &format!("From {}:\n{}", post.user.name, post.text))
            .await?;

        let summary = self.pipeline.relay_media(relay, channel, &post).await?;
        info!("Post {} relay finished: {:?}", post.id, summary);

        Ok(())
    }
}

/// Inbound validation for `!get`: exactly one argument, parseable as an
/// integer id. Anything else earns the usage message and nothing happens.
fn parse_post_id(args: &[&str]) -> Result<i64, ArgumentError> {
    match args {
        [id] => id
            .parse()
            .map_err(|_| ArgumentError::NotAnInteger((*id).to_string())),
        _ => Err(ArgumentError::WrongArgCount(args.len())),
    }
}

pub async fn run(config: Config) -> Result<()> {
    let token = match config.discord_token.clone() {
        Some(token) => token,
        None => env::var("DISCORD_TOKEN")
            .context("DISCORD_TOKEN environment variable is required when the config has no discord_token")?,
    };

    let bot = DiscordBot::new(token, config).await?;
    bot.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_integer_argument() {
        assert_eq!(parse_post_id(&["42"]).unwrap(), 42);
        assert_eq!(
            parse_post_id(&["1234567890123456789"]).unwrap(),
            1_234_567_890_123_456_789
        );
    }

    #[test]
    fn test_no_arguments_is_rejected() {
        assert!(matches!(
            parse_post_id(&[]),
            Err(ArgumentError::WrongArgCount(0))
        ));
    }

    #[test]
    fn test_two_arguments_are_rejected() {
        assert!(matches!(
            parse_post_id(&["1", "2"]),
            Err(ArgumentError::WrongArgCount(2))
        ));
    }

    #[test]
    fn test_non_integer_argument_is_rejected() {
        assert!(matches!(
            parse_post_id(&["abc"]),
            Err(ArgumentError::NotAnInteger(_))
        ));
    }
}
