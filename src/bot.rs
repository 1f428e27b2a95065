//! Message dispatch loop.
//!
//! Reads messages from a channel, filters out anything that is not a
//! command, routes commands through the registry and replies on the same
//! channel. Each command runs on its own task inside a tracing span keyed
//! by the message id. On shutdown, commands already running finish and
//! reply before the channel is closed.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::channels::{Channel, IncomingMessage, OutgoingResponse};
use crate::commands::{CommandRegistry, Invocation, parse_command};
use crate::config::SettingsStore;
use crate::error::Error;
use crate::messages;

/// Command bot bound to one channel.
#[derive(Clone)]
pub struct Bot {
    channel: Arc<dyn Channel>,
    registry: Arc<CommandRegistry>,
    settings: Arc<SettingsStore>,
}

impl Bot {
    pub fn new(
        channel: Arc<dyn Channel>,
        registry: Arc<CommandRegistry>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            channel,
            registry,
            settings,
        }
    }

    /// Run until Ctrl+C or until the channel stream ends.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channel.start().await?;

        tracing::info!(
            channel = self.channel.name(),
            commands = ?self.registry.list(),
            "Bot ready and listening"
        );

        let mut in_flight = JoinSet::new();

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_task_exit(done);
                    continue;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("Channel stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let span = tracing::info_span!(
                "command",
                invocation = %message.id,
                channel = %message.channel,
                user = %message.user_id,
            );
            let bot = self.clone();
            in_flight.spawn(
                async move {
                    let Some(reply) = bot.handle_message(&message).await else {
                        return;
                    };
                    if let Err(e) = bot
                        .channel
                        .respond(&message, OutgoingResponse::text(reply))
                        .await
                    {
                        tracing::warn!("Failed to send reply: {}", e);
                    }
                }
                .instrument(span),
            );
        }

        if !in_flight.is_empty() {
            tracing::info!(pending = in_flight.len(), "Waiting for running commands");
        }
        while let Some(done) = in_flight.join_next().await {
            log_task_exit(done);
        }

        self.channel.shutdown().await?;
        Ok(())
    }

    /// Handle one message. Returns the reply, or `None` when the message is
    /// not for the bot.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Option<String> {
        if message.is_bot {
            return None;
        }

        let settings = self.settings.snapshot().await;
        let prefix = settings.command_prefix.as_str();
        let (command_name, params) = parse_command(&message.content, prefix)?;
        let who = message.mention();

        let Some(command) = self.registry.get(&command_name) else {
            tracing::debug!(command = %command_name, "Unsupported command");
            return Some(messages::unsupported_command(&who, prefix, &command_name));
        };

        if command.admin_only() && !settings.is_admin(&message.user_id) {
            tracing::warn!(command = %command_name, "Permission denied");
            return Some(messages::permission_denied(&who, prefix, &command_name));
        }

        let invocation = Invocation {
            command: command_name,
            params,
            user_id: message.user_id.clone(),
            mention: who,
            invoked_at: message.received_at,
        };

        tracing::debug!(command = command.name(), params = ?invocation.params, "Running command");
        match command.execute(&invocation).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::error!(command = command.name(), error = %e, "Command failed");
                Some(messages::system_error(&invocation.mention))
            }
        }
    }
}

fn log_task_exit(done: Result<(), tokio::task::JoinError>) {
    if let Err(e) = done {
        tracing::error!("Command task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use secrecy::SecretString;

    use super::*;
    use crate::channels::MessageStream;
    use crate::commands::Command;
    use crate::config::VoteSettings;
    use crate::error::{ChannelError, Result};

    struct SilentChannel;

    #[async_trait]
    impl Channel for SilentChannel {
        fn name(&self) -> &str {
            "test"
        }
        async fn start(&self) -> std::result::Result<MessageStream, ChannelError> {
            Ok(Box::pin(futures::stream::empty()))
        }
        async fn respond(
            &self,
            _msg: &IncomingMessage,
            _response: OutgoingResponse,
        ) -> std::result::Result<(), ChannelError> {
            Ok(())
        }
    }

    struct Echo {
        admin_only: bool,
    }

    #[async_trait]
    impl Command for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn aliases(&self) -> &[&str] {
            &["say"]
        }
        fn description(&self) -> &str {
            "Echo parameters"
        }
        fn admin_only(&self) -> bool {
            self.admin_only
        }
        async fn execute(&self, invocation: &Invocation) -> Result<String> {
            Ok(invocation.params.join(" "))
        }
    }

    struct Broken;

    #[async_trait]
    impl Command for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        async fn execute(&self, _invocation: &Invocation) -> Result<String> {
            Err(crate::error::RpcError::AccountNotFound("secret-detail".into()).into())
        }
    }

    fn bot(admin_only: bool, admins: &[&str]) -> Bot {
        let mut settings = VoteSettings::new("curator", SecretString::from("k"));
        settings.admins = admins.iter().map(|s| s.to_string()).collect();
        let registry = CommandRegistry::new()
            .with(Arc::new(Echo { admin_only }))
            .with(Arc::new(Broken));
        Bot::new(
            Arc::new(SilentChannel),
            Arc::new(registry),
            SettingsStore::new(settings),
        )
    }

    fn message(user: &str, content: &str) -> IncomingMessage {
        IncomingMessage::new("test", user, content).with_user_name(user)
    }

    #[tokio::test]
    async fn routes_by_name_and_alias() {
        let bot = bot(false, &[]);
        assert_eq!(
            bot.handle_message(&message("u1", "$echo a b")).await,
            Some("a b".to_string())
        );
        assert_eq!(
            bot.handle_message(&message("u1", "$say hi")).await,
            Some("hi".to_string())
        );
    }

    #[tokio::test]
    async fn ignores_non_commands_and_bots() {
        let bot = bot(false, &[]);
        assert_eq!(bot.handle_message(&message("u1", "hello")).await, None);
        let from_bot = message("u2", "$echo hi").from_bot(true);
        assert_eq!(bot.handle_message(&from_bot).await, None);
    }

    #[tokio::test]
    async fn unknown_command_gets_help_hint() {
        let bot = bot(false, &[]);
        let reply = bot.handle_message(&message("u1", "$dance")).await.unwrap();
        assert_eq!(reply, messages::unsupported_command("u1", "$", "dance"));
    }

    #[tokio::test]
    async fn admin_gate() {
        let bot = bot(true, &["boss"]);
        let denied = bot.handle_message(&message("u1", "$echo hi")).await.unwrap();
        assert_eq!(denied, messages::permission_denied("u1", "$", "echo"));
        assert_eq!(
            bot.handle_message(&message("boss", "$echo hi")).await,
            Some("hi".to_string())
        );
    }

    #[tokio::test]
    async fn command_error_is_generic() {
        let bot = bot(false, &[]);
        let reply = bot.handle_message(&message("u1", "$broken")).await.unwrap();
        assert_eq!(reply, messages::system_error("u1"));
        assert!(!reply.contains("secret-detail"));
    }

    #[tokio::test]
    async fn run_stops_when_stream_ends() {
        assert!(bot(false, &[]).run().await.is_ok());
    }

    /// Delivers a fixed batch of messages and records every reply.
    struct ScriptedChannel {
        inbox: Vec<IncomingMessage>,
        replies: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn start(&self) -> std::result::Result<MessageStream, ChannelError> {
            Ok(Box::pin(futures::stream::iter(self.inbox.clone())))
        }
        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> std::result::Result<(), ChannelError> {
            self.replies.lock().unwrap().push(response.content);
            Ok(())
        }
    }

    struct Slow;

    #[async_trait]
    impl Command for Slow {
        fn name(&self) -> &str {
            "slow"
        }
        fn description(&self) -> &str {
            "Replies after a delay"
        }
        async fn execute(&self, _invocation: &Invocation) -> Result<String> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok("finished".to_string())
        }
    }

    #[tokio::test]
    async fn running_commands_reply_before_shutdown() {
        let channel = Arc::new(ScriptedChannel {
            inbox: vec![message("u1", "$slow"), message("u2", "$slow")],
            replies: std::sync::Mutex::new(Vec::new()),
        });
        let bot = Bot::new(
            channel.clone(),
            Arc::new(CommandRegistry::new().with(Arc::new(Slow))),
            SettingsStore::new(VoteSettings::new("curator", SecretString::from("k"))),
        );

        bot.run().await.unwrap();

        assert_eq!(*channel.replies.lock().unwrap(), vec!["finished", "finished"]);
    }
}
