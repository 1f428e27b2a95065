use std::sync::Arc;

use anyhow::Context;

use upvote_bot::bot::Bot;
use upvote_bot::chain::{ChainClient, JsonRpcClient};
use upvote_bot::channels::{Channel, CliChannel, TelegramChannel};
use upvote_bot::commands::CommandRegistry;
use upvote_bot::config::{BotConfig, SettingsStore};
use upvote_bot::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env().context("failed to load configuration")?;

    let _log_guard = logging::init_tracing(config.log_dir.as_deref())?;

    eprintln!("🗳️  Upvote bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Voter: {}", config.settings.username);
    eprintln!("   Node: {}", config.rpc.node_url);
    eprintln!("   Prefix: {}", config.settings.command_prefix);

    let chain: Arc<dyn ChainClient> =
        Arc::new(JsonRpcClient::new(&config.rpc).context("failed to build RPC client")?);
    let settings = SettingsStore::new(config.settings);
    let registry = Arc::new(CommandRegistry::builtin(chain, Arc::clone(&settings)));

    let channel: Arc<dyn Channel> = match config.telegram {
        Some(ref telegram) => {
            let channel = TelegramChannel::new(telegram);
            channel
                .health_check()
                .await
                .context("Telegram bot token rejected")?;
            eprintln!(
                "   Telegram: enabled (allowed: {})",
                telegram.allowed_users.join(", ")
            );
            Arc::new(channel)
        }
        None => {
            eprintln!("   Channel: cli (set TELEGRAM_BOT_TOKEN for Telegram)");
            eprintln!("   Type a command such as `$help` and press Enter.\n");
            Arc::new(
                config
                    .cli_user_id
                    .as_deref()
                    .map_or_else(CliChannel::new, CliChannel::with_user_id),
            )
        }
    };

    Bot::new(channel, registry, settings).run().await?;
    Ok(())
}
