//! Command registry: name and alias lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::ChainClient;
use crate::commands::command::Command;
use crate::commands::{ConfigCommand, HelpCommand, OwnerCommand, UpvoteCommand};
use crate::config::SettingsStore;

/// Registry of available commands.
///
/// Built once at startup. Aliases resolve to the same command instance.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
    /// Primary names in registration order.
    names: Vec<String>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn builtin(chain: Arc<dyn ChainClient>, settings: Arc<SettingsStore>) -> Self {
        Self::new()
            .with(Arc::new(HelpCommand::new(Arc::clone(&settings))))
            .with(Arc::new(OwnerCommand::new(Arc::clone(&settings))))
            .with(Arc::new(ConfigCommand::new(Arc::clone(&settings))))
            .with(Arc::new(UpvoteCommand::new(chain, settings)))
    }

    /// Register a command under its name and every alias.
    ///
    /// A name or alias already taken is left with its first owner.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_string();
        let keys = std::iter::once(command.name()).chain(command.aliases().iter().copied());
        for key in keys {
            if self.commands.contains_key(key) {
                tracing::warn!(
                    command = %name,
                    key,
                    "Rejected command registration: name already taken"
                );
                continue;
            }
            self.commands.insert(key.to_string(), Arc::clone(&command));
        }
        tracing::debug!("Registered command: {}", name);
        self.names.push(name);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, command: Arc<dyn Command>) -> Self {
        self.register(command);
        self
    }

    /// Get a command by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Primary command names.
    pub fn list(&self) -> &[String] {
        &self.names
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }
}
