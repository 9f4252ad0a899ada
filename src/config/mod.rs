use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub discord_token: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub allowed_users: HashSet<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

fn default_log_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub bearer_token: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            bearer_token: None,
        }
    }
}

fn default_api_base() -> String {
    "https://api.twitter.com/1.1".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {}", path))
    }

    pub fn logging_format(&self) -> &str {
        &self.logging.format
    }

    /// An empty allowlist leaves the bot open to everyone.
    pub fn is_authorized(&self, user_id: u64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            discord_token = "token-123"
            allowed_users = [11, 22]

            [logging]
            format = "pretty"

            [feed]
            api_base = "https://feed.example/1.1"
            bearer_token = "bearer-456"
            "#,
        )
        .unwrap();

        assert_eq!(config.discord_token.as_deref(), Some("token-123"));
        assert_eq!(config.logging_format(), "pretty");
        assert_eq!(config.feed.api_base, "https://feed.example/1.1");
        assert_eq!(config.feed.bearer_token.as_deref(), Some("bearer-456"));
        assert_eq!(config.allowed_users.len(), 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.discord_token.is_none());
        assert_eq!(config.logging_format(), "json");
        assert_eq!(config.feed.api_base, "https://api.twitter.com/1.1");
        assert!(config.feed.bearer_token.is_none());
        assert!(config.allowed_users.is_empty());
    }

    #[test]
    fn test_empty_allowlist_allows_anyone() {
        let config = Config::default();
        assert!(config.is_authorized(1));
        assert!(config.is_authorized(u64::MAX));
    }

    #[test]
    fn test_allowlist_restricts_to_members() {
        let config: Config = toml::from_str("allowed_users = [42]").unwrap();
        assert!(config.is_authorized(42));
        assert!(!config.is_authorized(43));
    }
}
