pub mod discord;
pub mod relay;

use crate::config::Config;
use anyhow::Result;

pub async fn run(config: Config) -> Result<()> {
    discord::run(config).await
}
