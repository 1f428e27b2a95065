//! Shared types for talking to the content platform.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RpcError;

/// Timestamp format used by the node (`2018-03-01T12:00:00`, always UTC).
const CHAIN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Maximum permlink length accepted by the platform.
const MAX_PERMLINK_LENGTH: usize = 255;

// ── Post reference ──────────────────────────────────────────────────

/// Identifies a post: author account plus the author-unique permlink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostRef {
    pub author: String,
    pub permlink: String,
}

impl PostRef {
    pub fn new(author: impl Into<String>, permlink: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            permlink: permlink.into(),
        }
    }
}

impl std::fmt::Display for PostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}/{}", self.author, self.permlink)
    }
}

// ── Account ─────────────────────────────────────────────────────────

/// The slice of account state the vote rules need.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountSnapshot {
    pub name: String,
    /// Voting power in hundredths of a percent (10000 = 100%) as of the last vote.
    #[serde(rename = "voting_power")]
    pub voting_power_raw: u16,
    #[serde(deserialize_with = "deserialize_chain_time")]
    pub last_vote_time: DateTime<Utc>,
    /// `None` when the node does not report it or the account never posted.
    #[serde(
        rename = "last_post",
        default,
        deserialize_with = "deserialize_optional_chain_time"
    )]
    pub last_post_time: Option<DateTime<Utc>>,
}

// ── Post ────────────────────────────────────────────────────────────

/// A vote recorded on a post.
#[derive(Debug, Clone, Deserialize)]
struct ActiveVote {
    voter: String,
}

/// The slice of post state the vote rules need.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostSnapshot {
    /// Zero when the node has no such post.
    pub id: u64,
    #[serde(
        rename = "created",
        default,
        deserialize_with = "deserialize_optional_chain_time"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "active_votes",
        default,
        deserialize_with = "deserialize_voters"
    )]
    pub voters: BTreeSet<String>,
}

impl PostSnapshot {
    pub fn exists(&self) -> bool {
        self.id != 0
    }

    pub fn has_voter(&self, account: &str) -> bool {
        self.voters.contains(account)
    }
}

// ── Operations ──────────────────────────────────────────────────────

/// A vote operation, ready for signing by the broadcast gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteOperation {
    pub voter: String,
    pub author: String,
    pub permlink: String,
    /// Weight in hundredths of a percent (10000 = 100%).
    pub weight: i16,
}

/// A reply comment operation, ready for signing by the broadcast gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentOperation {
    pub parent_author: String,
    pub parent_permlink: String,
    pub author: String,
    pub permlink: String,
    pub title: String,
    pub body: String,
    pub json_metadata: String,
}

impl CommentOperation {
    /// Build a reply to `parent` authored by `author`.
    ///
    /// The permlink follows the platform convention
    /// `re-<parent author>-<parent permlink>-<timestamp>`.
    pub fn reply(parent: &PostRef, author: &str, body: &str, now: DateTime<Utc>) -> Self {
        let stamp = now.format("%Y%m%dt%H%M%S%3fz").to_string();
        let mut permlink = format!("re-{}-{}-{stamp}", parent.author, parent.permlink)
            .to_lowercase()
            .replace(|c: char| !(c.is_ascii_alphanumeric() || c == '-'), "");
        permlink.truncate(MAX_PERMLINK_LENGTH);

        Self {
            parent_author: parent.author.clone(),
            parent_permlink: parent.permlink.clone(),
            author: author.to_string(),
            permlink,
            title: String::new(),
            body: body.to_string(),
            json_metadata: "{}".to_string(),
        }
    }
}

// ── Client trait ────────────────────────────────────────────────────

/// Asynchronous access to the content platform.
///
/// All failures are opaque [`RpcError`]s; business meaning (post missing,
/// already voted) is derived by the caller from successful responses.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch account state for `name`.
    async fn get_account(&self, name: &str) -> Result<AccountSnapshot, RpcError>;

    /// Fetch post state. A missing post is a snapshot with `id == 0`.
    async fn get_post(&self, post: &PostRef) -> Result<PostSnapshot, RpcError>;

    /// Sign and broadcast a vote. Not idempotent; callers must not retry blindly.
    async fn broadcast_vote(&self, vote: &VoteOperation, key: &SecretString)
    -> Result<(), RpcError>;

    /// Sign and broadcast a comment.
    async fn broadcast_comment(
        &self,
        comment: &CommentOperation,
        key: &SecretString,
    ) -> Result<(), RpcError>;
}

// ── Serde helpers ───────────────────────────────────────────────────

fn parse_chain_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), CHAIN_TIME_FORMAT)
        .map(|naive| naive.and_utc())
}

fn deserialize_chain_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_chain_time(&raw).map_err(serde::de::Error::custom)
}

/// The node reports "never" as the Unix epoch; that maps to `None`.
fn deserialize_optional_chain_time<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => {
            let time = parse_chain_time(&raw).map_err(serde::de::Error::custom)?;
            Ok((time.timestamp() > 0).then_some(time))
        }
    }
}

fn deserialize_voters<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let votes: Vec<ActiveVote> = Vec::deserialize(deserializer)?;
    Ok(votes.into_iter().map(|v| v.voter).collect())
}
