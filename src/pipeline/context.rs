//! The value threaded through the vote pipeline.

use chrono::{DateTime, Utc};

use crate::chain::{AccountSnapshot, PostRef, PostSnapshot};
use crate::error::PipelineError;

/// Per-invocation state, widened step by step.
///
/// Steps never mutate a context in place: they consume it and return a new
/// one through the `with_*` builders. Each optional field is filled by one
/// step and never replaced afterwards:
///
/// | field           | filled by                  |
/// |-----------------|----------------------------|
/// | `post_ref`      | `parse_post_url`           |
/// | `voter_account` | `enforce_min_voting_power` |
/// | `post_snapshot` | `validate_post`            |
#[derive(Debug, Clone, PartialEq)]
pub struct VoteContext {
    raw_params: Vec<String>,
    requester_id: String,
    invoked_at: DateTime<Utc>,
    post_ref: Option<PostRef>,
    voter_account: Option<AccountSnapshot>,
    post_snapshot: Option<PostSnapshot>,
}

impl VoteContext {
    /// Fresh context for one command invocation.
    pub fn new(
        raw_params: Vec<String>,
        requester_id: impl Into<String>,
        invoked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            raw_params,
            requester_id: requester_id.into(),
            invoked_at,
            post_ref: None,
            voter_account: None,
            post_snapshot: None,
        }
    }

    pub fn raw_params(&self) -> &[String] {
        &self.raw_params
    }

    pub fn requester_id(&self) -> &str {
        &self.requester_id
    }

    /// Clock reading shared by every rule of this invocation.
    pub fn invoked_at(&self) -> DateTime<Utc> {
        self.invoked_at
    }

    pub fn post_ref(&self) -> Option<&PostRef> {
        self.post_ref.as_ref()
    }

    pub fn voter_account(&self) -> Option<&AccountSnapshot> {
        self.voter_account.as_ref()
    }

    pub fn post_snapshot(&self) -> Option<&PostSnapshot> {
        self.post_snapshot.as_ref()
    }

    pub fn with_post_ref(self, post_ref: PostRef) -> Self {
        debug_assert!(self.post_ref.is_none(), "post_ref is already set");
        Self {
            post_ref: Some(post_ref),
            ..self
        }
    }

    pub fn with_voter_account(self, account: AccountSnapshot) -> Self {
        debug_assert!(self.voter_account.is_none(), "voter_account is already set");
        Self {
            voter_account: Some(account),
            ..self
        }
    }

    pub fn with_post_snapshot(self, post: PostSnapshot) -> Self {
        debug_assert!(self.post_snapshot.is_none(), "post_snapshot is already set");
        Self {
            post_snapshot: Some(post),
            ..self
        }
    }

    /// The parsed post, or an error naming the step that needed it.
    pub fn require_post_ref(&self, step: &'static str) -> Result<&PostRef, PipelineError> {
        self.post_ref.as_ref().ok_or(PipelineError::MissingContext {
            step,
            field: "post_ref",
        })
    }

    pub fn require_post_snapshot(
        &self,
        step: &'static str,
    ) -> Result<&PostSnapshot, PipelineError> {
        self.post_snapshot
            .as_ref()
            .ok_or(PipelineError::MissingContext {
                step,
                field: "post_snapshot",
            })
    }
}
