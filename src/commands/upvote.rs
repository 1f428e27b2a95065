//! `upvote` / `vote`: validate a post and vote for it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::chain::ChainClient;
use crate::commands::command::{Command, Invocation};
use crate::config::SettingsStore;
use crate::error::Result;
use crate::pipeline::{Pipeline, StepEnv, VoteContext, reporter, upvote_pipeline};

pub struct UpvoteCommand {
    chain: Arc<dyn ChainClient>,
    settings: Arc<SettingsStore>,
    pipeline: Pipeline,
}

impl UpvoteCommand {
    pub fn new(chain: Arc<dyn ChainClient>, settings: Arc<SettingsStore>) -> Self {
        Self {
            chain,
            settings,
            pipeline: upvote_pipeline(),
        }
    }
}

#[async_trait]
impl Command for UpvoteCommand {
    fn name(&self) -> &str {
        "upvote"
    }

    fn aliases(&self) -> &[&str] {
        &["vote"]
    }

    fn description(&self) -> &str {
        "Vote for a post after checking the vote rules"
    }

    async fn execute(&self, invocation: &Invocation) -> Result<String> {
        // One snapshot per invocation: a concurrent `config weight` change
        // does not affect a vote already in flight.
        let env = StepEnv {
            chain: Arc::clone(&self.chain),
            settings: self.settings.snapshot().await,
            mention: invocation.mention.clone(),
        };
        let ctx = VoteContext::new(
            invocation.params.clone(),
            invocation.user_id.clone(),
            invocation.invoked_at,
        );

        let outcome = self.pipeline.run(ctx, &env).await;
        info!(
            requester = %invocation.user_id,
            outcome = outcome.label(),
            "Upvote request finished"
        );

        Ok(reporter::render(
            &outcome,
            &invocation.mention,
            &env.settings.username,
        ))
    }
}
