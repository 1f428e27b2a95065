//! `help` / `info`: describe the bot and its commands.

use std::sync::Arc;

use async_trait::async_trait;

use crate::commands::command::{Command, Invocation};
use crate::config::SettingsStore;
use crate::error::Result;
use crate::messages;

pub struct HelpCommand {
    settings: Arc<SettingsStore>,
}

impl HelpCommand {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn aliases(&self) -> &[&str] {
        &["info"]
    }

    fn description(&self) -> &str {
        "Describe the bot and list its commands"
    }

    async fn execute(&self, invocation: &Invocation) -> Result<String> {
        let settings = self.settings.snapshot().await;
        Ok(messages::info(
            &invocation.mention,
            &settings.username,
            &settings.command_prefix,
        ))
    }
}
