//! Terminal results of a pipeline run.

use rust_decimal::Decimal;

use crate::pipeline::context::VoteContext;

/// Why a vote request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No URL was given.
    BadUrl,
    /// The URL does not point to a post, or the post does not exist.
    NotFound,
    /// Voting power is below the configured minimum.
    VpTooLow { current: Decimal, threshold: Decimal },
    /// The voter acted too recently; `last_post` is a relative description.
    TooOften { last_post: String },
    /// The voter already voted on the post.
    AlreadyVoted,
    /// The post is younger than the minimum age.
    TooEarly,
    /// The post is older than the maximum age.
    TooLate,
}

impl RejectReason {
    /// Stable short code for logs and tests.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadUrl => "bad-url",
            Self::NotFound => "not-found",
            Self::VpTooLow { .. } => "vp-too-low",
            Self::TooOften { .. } => "too-often",
            Self::AlreadyVoted => "already-voted",
            Self::TooEarly => "too-early",
            Self::TooLate => "too-late",
        }
    }
}

/// A business-rule refusal with its user-safe message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// How a pipeline run ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Every mandatory step passed; carries the final context.
    Success(VoteContext),
    /// A rule refused the request.
    Rejected(Rejection),
    /// Something below the business rules broke. The cause is for logs only.
    InfrastructureFailure(String),
}

impl Outcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Rejected(r) => r.reason.code(),
            Self::InfrastructureFailure(_) => "infrastructure_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The rejection reason, if the run was refused.
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Rejected(r) => Some(&r.reason),
            _ => None,
        }
    }
}
