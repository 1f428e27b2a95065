//! Sequential step runner.
//!
//! A pipeline is an ordered list of steps over a [`VoteContext`]. Mandatory
//! steps can stop the run two ways: by aborting with a [`Rejection`] or by
//! failing with a [`PipelineError`]. Best-effort steps never change the
//! outcome; whatever goes wrong in them is logged and dropped.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::chain::ChainClient;
use crate::config::VoteSettings;
use crate::error::PipelineError;
use crate::pipeline::context::VoteContext;
use crate::pipeline::outcome::{Outcome, Rejection};

/// Whether a step can decide the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Mandatory,
    BestEffort,
}

/// What a step hands back to the runner.
#[derive(Debug)]
pub enum StepFlow {
    /// Proceed with the (possibly widened) context.
    Continue(VoteContext),
    /// Stop the run with a user-facing refusal.
    Abort(Rejection),
}

pub type StepResult = Result<StepFlow, PipelineError>;

/// Read-only collaborators shared by every step of one invocation.
pub struct StepEnv {
    pub chain: Arc<dyn ChainClient>,
    pub settings: VoteSettings,
    /// How to address the requester in replies.
    pub mention: String,
}

/// One unit of pipeline work.
#[async_trait]
pub trait Step: Send + Sync {
    /// Step name for logging.
    fn name(&self) -> &'static str;

    fn kind(&self) -> StepKind {
        StepKind::Mandatory
    }

    async fn run(&self, ctx: VoteContext, env: &StepEnv) -> StepResult;
}

/// An ordered chain of steps.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order and decide the outcome.
    pub async fn run(&self, ctx: VoteContext, env: &StepEnv) -> Outcome {
        let mut ctx = ctx;

        for step in &self.steps {
            let name = step.name();
            match step.kind() {
                StepKind::Mandatory => {
                    debug!(step = name, "Running step");
                    match step.run(ctx, env).await {
                        Ok(StepFlow::Continue(next)) => ctx = next,
                        Ok(StepFlow::Abort(rejection)) => {
                            info!(
                                step = name,
                                reason = rejection.reason.code(),
                                "Vote request rejected"
                            );
                            return Outcome::Rejected(rejection);
                        }
                        Err(e) => {
                            error!(step = name, error = %e, "Pipeline step failed");
                            return Outcome::InfrastructureFailure(e.to_string());
                        }
                    }
                }
                StepKind::BestEffort => {
                    debug!(step = name, "Running best-effort step");
                    match step.run(ctx.clone(), env).await {
                        Ok(StepFlow::Continue(next)) => ctx = next,
                        Ok(StepFlow::Abort(rejection)) => {
                            warn!(
                                step = name,
                                reason = rejection.reason.code(),
                                "Best-effort step aborted; ignoring"
                            );
                        }
                        Err(e) => {
                            warn!(step = name, error = %e, "Best-effort step failed; ignoring");
                        }
                    }
                }
            }
        }

        Outcome::Success(ctx)
    }
}
