//! Command trait and invocation parsing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// One parsed command message.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Command name as typed, without the prefix.
    pub command: String,
    pub params: Vec<String>,
    /// Stable chat id of the requester.
    pub user_id: String,
    /// How to address the requester in the reply.
    pub mention: String,
    pub invoked_at: DateTime<Utc>,
}

/// Split `content` into a command name and its parameters.
///
/// Returns `None` when `content` does not start with `prefix` or names no
/// command.
pub fn parse_command(content: &str, prefix: &str) -> Option<(String, Vec<String>)> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content.trim_start().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let command = parts.next()?.to_string();
    Some((command, parts.map(str::to_string).collect()))
}

/// A chat command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name used after the prefix.
    fn name(&self) -> &str;

    /// Other names that run the same command.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// One-line description.
    fn description(&self) -> &str;

    /// Whether only configured admins may run it.
    fn admin_only(&self) -> bool {
        false
    }

    /// Run the command and produce the reply text.
    async fn execute(&self, invocation: &Invocation) -> Result<String>;
}
