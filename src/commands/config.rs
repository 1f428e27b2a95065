//! `config`: inspect settings and change the vote weight. Admins only.
//!
//! - no parameters: list parameter names
//! - `<name>`: show the current value
//! - `<name> <value>`: change it (only `weight` is changeable)

use std::sync::Arc;

use async_trait::async_trait;

use crate::commands::command::{Command, Invocation};
use crate::config::{CONFIG_PARAMETERS, SettingsStore};
use crate::error::{ConfigError, Result};
use crate::messages;

pub struct ConfigCommand {
    settings: Arc<SettingsStore>,
}

impl ConfigCommand {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Command for ConfigCommand {
    fn name(&self) -> &str {
        "config"
    }

    fn description(&self) -> &str {
        "Show or change bot settings"
    }

    fn admin_only(&self) -> bool {
        true
    }

    async fn execute(&self, invocation: &Invocation) -> Result<String> {
        let who = invocation.mention.as_str();
        let Some((name, options)) = invocation.params.split_first() else {
            let prefix = self.settings.snapshot().await.command_prefix;
            return Ok(messages::config_info(who, &prefix, CONFIG_PARAMETERS));
        };

        if options.is_empty() {
            return Ok(match self.settings.get(name).await {
                Some(value) => messages::config_value(who, name, &value),
                None => messages::config_unknown_parameter(who, name),
            });
        }

        let reply = match self.settings.set(name, options).await {
            Ok(value) => {
                tracing::info!(
                    user = %invocation.user_id,
                    parameter = %name,
                    %value,
                    "Config parameter changed"
                );
                messages::config_value_changed(who, name, &value)
            }
            Err(ConfigError::UnknownParameter(_)) => messages::config_unknown_parameter(who, name),
            Err(e) => messages::config_value_error(who, name, e),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use secrecy::SecretString;

    use super::*;
    use crate::config::VoteSettings;

    fn invocation(params: &[&str]) -> Invocation {
        Invocation {
            command: "config".into(),
            params: params.iter().map(|s| s.to_string()).collect(),
            user_id: "1".into(),
            mention: "@admin".into(),
            invoked_at: Utc::now(),
        }
    }

    fn store() -> Arc<SettingsStore> {
        SettingsStore::new(VoteSettings::new("curator", SecretString::from("k")))
    }

    #[test]
    fn config_is_admin_only() {
        assert!(ConfigCommand::new(store()).admin_only());
    }

    #[tokio::test]
    async fn no_params_lists_parameters() {
        let reply = ConfigCommand::new(store())
            .execute(&invocation(&[]))
            .await
            .unwrap();
        assert!(reply.contains("weight"));
        assert!(reply.contains("upvoteSuccessComment"));
    }

    #[tokio::test]
    async fn single_param_shows_value() {
        let reply = ConfigCommand::new(store())
            .execute(&invocation(&["username"]))
            .await
            .unwrap();
        assert_eq!(
            reply,
            messages::config_value("@admin", "username", &serde_json::json!("curator"))
        );
    }

    #[tokio::test]
    async fn posting_key_is_not_readable() {
        let reply = ConfigCommand::new(store())
            .execute(&invocation(&["postingKey"]))
            .await
            .unwrap();
        assert_eq!(reply, messages::config_unknown_parameter("@admin", "postingKey"));
    }

    #[tokio::test]
    async fn weight_change_applies() {
        let settings = store();
        let reply = ConfigCommand::new(Arc::clone(&settings))
            .execute(&invocation(&["weight", "50"]))
            .await
            .unwrap();
        assert!(reply.contains("now"));
        assert_eq!(settings.snapshot().await.weight, dec!(50));
    }

    #[tokio::test]
    async fn weight_out_of_range_is_refused() {
        let settings = store();
        let reply = ConfigCommand::new(Arc::clone(&settings))
            .execute(&invocation(&["weight", "150"]))
            .await
            .unwrap();
        assert!(reply.contains("couldn't change"));
        assert_eq!(settings.snapshot().await.weight, dec!(100));
    }

    #[tokio::test]
    async fn other_parameters_are_immutable() {
        let reply = ConfigCommand::new(store())
            .execute(&invocation(&["minVp", "50"]))
            .await
            .unwrap();
        assert!(reply.contains("cannot be changed"));
    }
}
