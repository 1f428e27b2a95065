//! Configuration types.
//!
//! Everything is read from environment variables at startup. The vote rules
//! live in a [`SettingsStore`] so the `config` command can adjust the vote
//! weight at runtime; the pipeline only ever sees a cloned snapshot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use tokio::sync::RwLock;

use crate::error::ConfigError;
use crate::humanize;

/// Default comment left on a post after a successful vote.
pub const DEFAULT_SUCCESS_COMMENT: &str =
    "This post has been upvoted by our community curation bot. Keep up the good work!";

const MIN_WEIGHT: Decimal = dec!(0.01);
const MAX_WEIGHT: Decimal = dec!(100);

/// Longest accepted post age bound.
const MAX_POST_AGE_DAYS: i64 = 36_500;

/// Vote rules and voter identity consumed by the upvote pipeline.
#[derive(Debug, Clone)]
pub struct VoteSettings {
    /// Vote weight in percent (0.01 to 100).
    pub weight: Decimal,
    /// Minimum voting power (percent) required before voting.
    pub min_vp: Option<Decimal>,
    /// Minimum time between two votes, measured from the voter's last post.
    pub vote_interval: Option<Duration>,
    /// Posts younger than this are rejected.
    pub min_post_age: Option<Duration>,
    /// Posts older than this are rejected.
    pub max_post_age: Option<Duration>,
    /// Account that casts the vote.
    pub username: String,
    /// Posting key for `username`.
    pub posting_key: Arc<SecretString>,
    /// Body of the courtesy comment left after voting.
    pub success_comment: String,
    /// Prefix marking a chat message as a command.
    pub command_prefix: String,
    /// Chat user ids allowed to run admin commands. Empty means everyone.
    pub admins: Vec<String>,
}

impl VoteSettings {
    /// Settings with the given voter identity and every optional rule unset.
    pub fn new(username: impl Into<String>, posting_key: SecretString) -> Self {
        Self {
            weight: MAX_WEIGHT,
            min_vp: None,
            vote_interval: None,
            min_post_age: None,
            max_post_age: None,
            username: username.into(),
            posting_key: Arc::new(posting_key),
            success_comment: DEFAULT_SUCCESS_COMMENT.to_string(),
            command_prefix: "$".to_string(),
            admins: Vec::new(),
        }
    }

    /// Whether `user_id` may run admin-only commands.
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.is_empty() || self.admins.iter().any(|a| a == user_id)
    }
}

/// Remote platform endpoints.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// JSON-RPC node used for reads.
    pub node_url: String,
    /// Signing gateway that accepts vote and comment operations.
    pub broadcast_url: String,
    /// Per-request timeout.
    pub timeout: StdDuration,
}

/// Telegram transport settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Arc<SecretString>,
    pub allowed_users: Vec<String>,
}

/// Full bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub settings: VoteSettings,
    pub rpc: RpcConfig,
    /// `None` runs the bot on the local CLI channel.
    pub telegram: Option<TelegramConfig>,
    /// User id for CLI input. Set it to an admin id to try admin commands.
    pub cli_user_id: Option<String>,
    /// Directory for rolling log files, if file logging is wanted.
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.into()));

        let username = required("UPVOTE_BOT_USERNAME")?;
        let posting_key = SecretString::from(required("UPVOTE_BOT_POSTING_KEY")?);
        let mut settings = VoteSettings::new(username, posting_key);

        if let Some(raw) = get("UPVOTE_BOT_WEIGHT") {
            settings.weight = parse_weight("UPVOTE_BOT_WEIGHT", &raw)?;
        }
        settings.min_vp = get("UPVOTE_BOT_MIN_VP")
            .map(|raw| parse_decimal("UPVOTE_BOT_MIN_VP", &raw))
            .transpose()?
            .filter(|vp| !vp.is_zero());
        settings.vote_interval = get("UPVOTE_BOT_VOTE_INTERVAL_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| invalid("UPVOTE_BOT_VOTE_INTERVAL_SECS", "expected seconds"))
            })
            .transpose()?
            .filter(|d| !d.is_zero());
        settings.min_post_age = get("UPVOTE_BOT_MIN_POST_AGE")
            .map(|raw| parse_age("UPVOTE_BOT_MIN_POST_AGE", &raw))
            .transpose()?;
        settings.max_post_age = get("UPVOTE_BOT_MAX_POST_AGE")
            .map(|raw| parse_age("UPVOTE_BOT_MAX_POST_AGE", &raw))
            .transpose()?;
        if let Some(comment) = get("UPVOTE_BOT_SUCCESS_COMMENT") {
            settings.success_comment = comment;
        }
        if let Some(prefix) = get("UPVOTE_BOT_COMMAND_PREFIX") {
            settings.command_prefix = prefix.trim().to_string();
        }
        settings.admins = split_list(get("UPVOTE_BOT_ADMINS").unwrap_or_default());

        let timeout_secs: u64 = match get("UPVOTE_BOT_RPC_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| invalid("UPVOTE_BOT_RPC_TIMEOUT_SECS", "expected seconds"))?,
            None => 15,
        };
        let rpc = RpcConfig {
            node_url: get("UPVOTE_BOT_RPC_URL")
                .unwrap_or_else(|| "https://api.steemit.com".to_string()),
            broadcast_url: required("UPVOTE_BOT_BROADCAST_URL")?,
            timeout: StdDuration::from_secs(timeout_secs),
        };

        let telegram = get("TELEGRAM_BOT_TOKEN").map(|token| TelegramConfig {
            bot_token: Arc::new(SecretString::from(token)),
            allowed_users: {
                let users = split_list(get("TELEGRAM_ALLOWED_USERS").unwrap_or_default());
                if users.is_empty() { vec!["*".to_string()] } else { users }
            },
        });

        Ok(Self {
            settings,
            rpc,
            telegram,
            cli_user_id: get("UPVOTE_BOT_CLI_USER_ID").map(|id| id.trim().to_string()),
            log_dir: get("UPVOTE_BOT_LOG_DIR").map(PathBuf::from),
        })
    }
}

/// Parameters the `config` command can inspect.
pub const CONFIG_PARAMETERS: &[&str] = &[
    "weight",
    "minVp",
    "voteInterval",
    "minPostAge",
    "maxPostAge",
    "username",
    "commandPrefix",
    "adminList",
    "upvoteSuccessComment",
];

/// Shared, runtime-adjustable vote settings.
pub struct SettingsStore {
    inner: RwLock<VoteSettings>,
}

impl SettingsStore {
    pub fn new(settings: VoteSettings) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(settings),
        })
    }

    /// Clone the current settings for one invocation.
    pub async fn snapshot(&self) -> VoteSettings {
        self.inner.read().await.clone()
    }

    /// Current value of a named parameter as JSON, or `None` if unknown.
    ///
    /// The posting key is not addressable.
    pub async fn get(&self, name: &str) -> Option<serde_json::Value> {
        let s = self.inner.read().await;
        let age = |d: Option<Duration>| {
            d.map(humanize::describe_duration)
                .map_or(serde_json::Value::Null, serde_json::Value::from)
        };
        let value = match name {
            "weight" => serde_json::json!(s.weight.normalize().to_string()),
            "minVp" => s
                .min_vp
                .map_or(serde_json::Value::Null, |v| serde_json::json!(v.normalize().to_string())),
            "voteInterval" => s
                .vote_interval
                .map_or(serde_json::Value::Null, |d| serde_json::json!(d.num_seconds())),
            "minPostAge" => age(s.min_post_age),
            "maxPostAge" => age(s.max_post_age),
            "username" => serde_json::json!(s.username),
            "commandPrefix" => serde_json::json!(s.command_prefix),
            "adminList" => serde_json::json!(s.admins),
            "upvoteSuccessComment" => serde_json::json!(s.success_comment),
            _ => return None,
        };
        Some(value)
    }

    /// Change a parameter at runtime. Only `weight` is changeable.
    pub async fn set(
        &self,
        name: &str,
        options: &[String],
    ) -> Result<serde_json::Value, ConfigError> {
        match name {
            "weight" => {
                let raw = options.first().map(String::as_str).unwrap_or_default();
                let weight = parse_weight(name, raw)?;
                self.inner.write().await.weight = weight;
                tracing::info!(%weight, "Vote weight changed at runtime");
                Ok(serde_json::json!(weight.normalize().to_string()))
            }
            other if CONFIG_PARAMETERS.contains(&other) => {
                Err(ConfigError::Immutable(other.into()))
            }
            other => Err(ConfigError::UnknownParameter(other.into())),
        }
    }
}

/// Parse and range-check a vote weight percentage.
pub fn parse_weight(key: &str, raw: &str) -> Result<Decimal, ConfigError> {
    let weight = parse_decimal(key, raw)?;
    if weight < MIN_WEIGHT || weight > MAX_WEIGHT {
        return Err(invalid(
            key,
            &format!("{weight} is not in range {MIN_WEIGHT}..={MAX_WEIGHT}"),
        ));
    }
    Ok(weight)
}

fn parse_decimal(key: &str, raw: &str) -> Result<Decimal, ConfigError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| invalid(key, &format!("{raw:?} is not a number ({e})")))
}

fn parse_age(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let age = humanize::parse_duration(raw)
        .ok_or_else(|| invalid(key, &format!("{raw:?} is not a duration like \"6 days\"")))?;
    if age > Duration::days(MAX_POST_AGE_DAYS) {
        return Err(invalid(key, &format!("{raw:?} exceeds {MAX_POST_AGE_DAYS} days")));
    }
    Ok(age)
}

fn split_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
