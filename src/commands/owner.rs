//! `owner`: list the bot's administrators.

use std::sync::Arc;

use async_trait::async_trait;

use crate::commands::command::{Command, Invocation};
use crate::config::SettingsStore;
use crate::error::Result;
use crate::messages;

pub struct OwnerCommand {
    settings: Arc<SettingsStore>,
}

impl OwnerCommand {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

/// Render admin ids as chat mentions. Numeric ids are shown as-is.
fn mention_admins(admins: &[String]) -> String {
    admins
        .iter()
        .map(|a| {
            if a.chars().all(|c| c.is_ascii_digit()) {
                a.clone()
            } else {
                format!("@{}", a.trim_start_matches('@'))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl Command for OwnerCommand {
    fn name(&self) -> &str {
        "owner"
    }

    fn description(&self) -> &str {
        "List bot administrators"
    }

    async fn execute(&self, invocation: &Invocation) -> Result<String> {
        let settings = self.settings.snapshot().await;
        Ok(messages::owner_info(
            &invocation.mention,
            &mention_admins(&settings.admins),
        ))
    }
}
