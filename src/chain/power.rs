//! Voting power regeneration.
//!
//! The platform stores voting power as of the account's last vote and
//! regenerates it linearly: an empty account is back to 100% after five days.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::chain::types::AccountSnapshot;

/// 100% voting power in the platform's integer unit.
pub const FULL_VOTING_POWER: i64 = 10_000;

/// Seconds needed to regenerate from 0% to 100%.
pub const REGENERATION_SECONDS: i64 = 5 * 24 * 60 * 60;

/// Effective voting power of `account` at `now`, as a percentage with two decimals.
///
/// Non-decreasing in `now`, capped at 100. A clock that reads earlier than
/// the last vote counts as zero elapsed time.
pub fn effective_voting_power(account: &AccountSnapshot, now: DateTime<Utc>) -> Decimal {
    let elapsed = now
        .signed_duration_since(account.last_vote_time)
        .num_seconds()
        .max(0);
    let regenerated = elapsed.saturating_mul(FULL_VOTING_POWER) / REGENERATION_SECONDS;
    let current = i64::from(account.voting_power_raw)
        .saturating_add(regenerated)
        .min(FULL_VOTING_POWER);

    Decimal::new(current, 2)
}
