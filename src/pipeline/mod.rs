//! Upvote validation-and-execution pipeline.
//!
//! A `$upvote <url>` request flows through:
//! 1. [`steps`]: parse, check voting power, cooldown, post, then vote
//! 2. [`runner::Pipeline::run`]: sequential execution, first refusal wins
//! 3. [`reporter::render`]: one chat reply per outcome
//!
//! Steps only read the platform until `cast_vote`. A rejection before it
//! guarantees no vote was broadcast.

pub mod context;
pub mod outcome;
pub mod reporter;
pub mod rules;
pub mod runner;
pub mod steps;

pub use context::VoteContext;
pub use outcome::{Outcome, RejectReason, Rejection};
pub use runner::{Pipeline, Step, StepEnv, StepFlow, StepKind, StepResult};
pub use steps::upvote_pipeline;
