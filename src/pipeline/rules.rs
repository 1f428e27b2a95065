//! Vote rule policies.
//!
//! Pure functions of fetched platform data, settings and the invocation
//! clock. Steps call these and turn a failed check into a rejection.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::chain::power::effective_voting_power;
use crate::chain::{AccountSnapshot, PostSnapshot};

/// Result of the voting power check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingPowerCheck {
    Sufficient(Decimal),
    TooLow { current: Decimal, threshold: Decimal },
}

/// Compare the account's effective voting power against `threshold`.
pub fn check_voting_power(
    account: &AccountSnapshot,
    threshold: Decimal,
    now: DateTime<Utc>,
) -> VotingPowerCheck {
    let current = effective_voting_power(account, now);
    if current < threshold {
        VotingPowerCheck::TooLow { current, threshold }
    } else {
        VotingPowerCheck::Sufficient(current)
    }
}

/// Whether the voter acted less than `interval` ago.
pub fn within_cooldown(last_post: DateTime<Utc>, interval: Duration, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_post) < interval
}

/// Whether `voter` is already among the post's voters.
pub fn already_voted(post: &PostSnapshot, voter: &str) -> bool {
    post.has_voter(voter)
}

/// Where a post's age falls relative to the configured window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAge {
    InWindow,
    /// Younger than the minimum age.
    TooEarly,
    /// Older than the maximum age.
    TooLate,
}

/// Place a post created at `created_at` in the `[min_age, max_age]` window.
///
/// An unset bound does not constrain. The minimum is checked first. A bound
/// reaching past the earliest representable time leaves no post old enough
/// for `min_age` and none too old for `max_age`.
pub fn check_post_age(
    created_at: DateTime<Utc>,
    min_age: Option<Duration>,
    max_age: Option<Duration>,
    now: DateTime<Utc>,
) -> PostAge {
    if let Some(min_age) = min_age
        && now
            .checked_sub_signed(min_age)
            .is_none_or(|cutoff| created_at > cutoff)
    {
        return PostAge::TooEarly;
    }
    if let Some(max_age) = max_age
        && now
            .checked_sub_signed(max_age)
            .is_some_and(|cutoff| created_at < cutoff)
    {
        return PostAge::TooLate;
    }
    PostAge::InWindow
}
