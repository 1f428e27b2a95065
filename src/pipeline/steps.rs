//! The upvote command's steps.
//!
//! Order matters: each step relies on the context fields filled by the
//! steps before it.
//!
//! 1. `parse_post_url`: `raw_params[0]` → `post_ref`
//! 2. `enforce_min_voting_power`: fetch voter → `voter_account`
//! 3. `enforce_vote_interval`: cooldown against the voter's last post
//! 4. `validate_post`: fetch post → `post_snapshot`, existence/duplicate/age
//! 5. `cast_vote`: broadcast the vote (single attempt)
//! 6. `add_success_comment`: courtesy reply, best-effort

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};

use crate::chain::url::parse_post_url;
use crate::chain::{CommentOperation, VoteOperation};
use crate::error::PipelineError;
use crate::humanize;
use crate::messages;
use crate::pipeline::context::VoteContext;
use crate::pipeline::outcome::{RejectReason, Rejection};
use crate::pipeline::rules::{self, PostAge, VotingPowerCheck};
use crate::pipeline::runner::{Pipeline, Step, StepEnv, StepFlow, StepKind, StepResult};

/// The full upvote pipeline in execution order.
pub fn upvote_pipeline() -> Pipeline {
    Pipeline::new()
        .step(ParsePostUrl)
        .step(EnforceMinVotingPower)
        .step(EnforceVoteInterval)
        .step(ValidatePost)
        .step(CastVote)
        .step(AddSuccessComment)
}

fn abort(reason: RejectReason, message: String) -> StepResult {
    Ok(StepFlow::Abort(Rejection::new(reason, message)))
}

// ── 1. URL ──────────────────────────────────────────────────────────

/// Turn the first parameter into a post reference. No RPC.
pub struct ParsePostUrl;

#[async_trait]
impl Step for ParsePostUrl {
    fn name(&self) -> &'static str {
        "parse_post_url"
    }

    async fn run(&self, ctx: VoteContext, env: &StepEnv) -> StepResult {
        let prefix = &env.settings.command_prefix;
        let Some(url) = ctx.raw_params().first().filter(|p| !p.trim().is_empty()) else {
            debug!(params = ?ctx.raw_params(), "No post URL given");
            return abort(
                RejectReason::BadUrl,
                messages::upvote_post_url_error(&env.mention, prefix),
            );
        };

        match parse_post_url(url) {
            Some(post_ref) => Ok(StepFlow::Continue(ctx.with_post_ref(post_ref))),
            None => {
                debug!(url = %url, "Post URL did not parse");
                abort(
                    RejectReason::NotFound,
                    messages::upvote_post_not_found(&env.mention, prefix),
                )
            }
        }
    }
}

// ── 2. Voting power ─────────────────────────────────────────────────

/// Load the voter account and refuse when voting power is below `min_vp`.
///
/// The account is also loaded when only the cooldown is configured, since
/// the cooldown step reads the last-post time from it.
pub struct EnforceMinVotingPower;

#[async_trait]
impl Step for EnforceMinVotingPower {
    fn name(&self) -> &'static str {
        "enforce_min_voting_power"
    }

    async fn run(&self, ctx: VoteContext, env: &StepEnv) -> StepResult {
        let settings = &env.settings;
        let min_vp = settings.min_vp.filter(|v| !v.is_zero());
        if min_vp.is_none() && settings.vote_interval.is_none() {
            return Ok(StepFlow::Continue(ctx));
        }

        let account = env
            .chain
            .get_account(&settings.username)
            .await
            .map_err(|source| PipelineError::Rpc {
                step: self.name(),
                source,
            })?;

        if let Some(threshold) = min_vp
            && let VotingPowerCheck::TooLow { current, threshold } =
                rules::check_voting_power(&account, threshold, ctx.invoked_at())
        {
            return abort(
                RejectReason::VpTooLow { current, threshold },
                messages::upvote_vp_too_low(
                    &env.mention,
                    &settings.username,
                    current.normalize(),
                    threshold.normalize(),
                ),
            );
        }

        Ok(StepFlow::Continue(ctx.with_voter_account(account)))
    }
}

// ── 3. Cooldown ─────────────────────────────────────────────────────

/// Refuse when the voter's last post is more recent than `vote_interval`.
pub struct EnforceVoteInterval;

#[async_trait]
impl Step for EnforceVoteInterval {
    fn name(&self) -> &'static str {
        "enforce_vote_interval"
    }

    async fn run(&self, ctx: VoteContext, env: &StepEnv) -> StepResult {
        let Some(interval) = env.settings.vote_interval else {
            return Ok(StepFlow::Continue(ctx));
        };
        let Some(last_post) = ctx.voter_account().and_then(|a| a.last_post_time) else {
            warn!(
                voter = %env.settings.username,
                "Vote interval is configured but the account has no last post time; skipping cooldown"
            );
            return Ok(StepFlow::Continue(ctx));
        };

        let now = ctx.invoked_at();
        if rules::within_cooldown(last_post, interval, now) {
            let last_post = humanize::relative_time(last_post, now);
            return abort(
                RejectReason::TooOften {
                    last_post: last_post.clone(),
                },
                messages::upvote_too_often(&env.mention, &last_post),
            );
        }

        Ok(StepFlow::Continue(ctx))
    }
}

// ── 4. Post ─────────────────────────────────────────────────────────

/// Load the target post and check existence, duplicate vote and age.
pub struct ValidatePost;

#[async_trait]
impl Step for ValidatePost {
    fn name(&self) -> &'static str {
        "validate_post"
    }

    async fn run(&self, ctx: VoteContext, env: &StepEnv) -> StepResult {
        let settings = &env.settings;
        let post_ref = ctx.require_post_ref(self.name())?;
        let post = env
            .chain
            .get_post(post_ref)
            .await
            .map_err(|source| PipelineError::Rpc {
                step: self.name(),
                source,
            })?;

        if !post.exists() {
            return abort(
                RejectReason::NotFound,
                messages::upvote_post_not_found(&env.mention, &settings.command_prefix),
            );
        }

        if rules::already_voted(&post, &settings.username) {
            return abort(
                RejectReason::AlreadyVoted,
                messages::upvote_already_voted(&env.mention, &settings.username),
            );
        }

        if let Some(created_at) = post.created_at
            && (settings.min_post_age.is_some() || settings.max_post_age.is_some())
        {
            let verdict = rules::check_post_age(
                created_at,
                settings.min_post_age,
                settings.max_post_age,
                ctx.invoked_at(),
            );
            if verdict != PostAge::InWindow {
                let min = settings.min_post_age.map(humanize::describe_duration);
                let max = settings.max_post_age.map(humanize::describe_duration);
                let window = messages::post_age_window(min.as_deref(), max.as_deref());
                return match verdict {
                    PostAge::TooEarly => abort(
                        RejectReason::TooEarly,
                        messages::upvote_too_early(&env.mention, &window),
                    ),
                    _ => abort(
                        RejectReason::TooLate,
                        messages::upvote_too_late(&env.mention, &window),
                    ),
                };
            }
        }

        Ok(StepFlow::Continue(ctx.with_post_snapshot(post)))
    }
}

// ── 5. Vote ─────────────────────────────────────────────────────────

/// Broadcast the vote. One attempt only: a vote is not idempotent.
pub struct CastVote;

#[async_trait]
impl Step for CastVote {
    fn name(&self) -> &'static str {
        "cast_vote"
    }

    async fn run(&self, ctx: VoteContext, env: &StepEnv) -> StepResult {
        let settings = &env.settings;
        let post_ref = ctx.require_post_ref(self.name())?;
        ctx.require_post_snapshot(self.name())?;

        let weight = (settings.weight * dec!(100))
            .round()
            .to_i16()
            .ok_or_else(|| PipelineError::InvalidWeight(settings.weight.to_string()))?;

        let vote = VoteOperation {
            voter: settings.username.clone(),
            author: post_ref.author.clone(),
            permlink: post_ref.permlink.clone(),
            weight,
        };
        env.chain
            .broadcast_vote(&vote, &settings.posting_key)
            .await
            .map_err(|source| PipelineError::Rpc {
                step: self.name(),
                source,
            })?;

        info!(
            voter = %vote.voter,
            post = %post_ref,
            weight,
            requester = %ctx.requester_id(),
            "Vote broadcast"
        );
        Ok(StepFlow::Continue(ctx))
    }
}

// ── 6. Comment ──────────────────────────────────────────────────────

/// Reply to the voted post with the configured comment.
pub struct AddSuccessComment;

#[async_trait]
impl Step for AddSuccessComment {
    fn name(&self) -> &'static str {
        "add_success_comment"
    }

    fn kind(&self) -> StepKind {
        StepKind::BestEffort
    }

    async fn run(&self, ctx: VoteContext, env: &StepEnv) -> StepResult {
        let settings = &env.settings;
        let post_ref = ctx.require_post_ref(self.name())?;

        let comment = CommentOperation::reply(
            post_ref,
            &settings.username,
            &settings.success_comment,
            ctx.invoked_at(),
        );
        env.chain
            .broadcast_comment(&comment, &settings.posting_key)
            .await
            .map_err(|source| PipelineError::Rpc {
                step: self.name(),
                source,
            })?;

        debug!(permlink = %comment.permlink, "Success comment posted");
        Ok(StepFlow::Continue(ctx))
    }
}
