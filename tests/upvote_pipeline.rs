//! End-to-end tests of the upvote pipeline against a recording chain client.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use secrecy::SecretString;

use upvote_bot::bot::Bot;
use upvote_bot::chain::{
    AccountSnapshot, ChainClient, CommentOperation, PostRef, PostSnapshot, VoteOperation,
};
use upvote_bot::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use upvote_bot::commands::{Command, CommandRegistry, Invocation, UpvoteCommand};
use upvote_bot::config::{SettingsStore, VoteSettings};
use upvote_bot::error::{ChannelError, RpcError};
use upvote_bot::messages;
use upvote_bot::pipeline::{Outcome, RejectReason, StepEnv, VoteContext, upvote_pipeline};

const POST_URL: &str = "https://steemit.com/photography/@alice/sunset-at-sea";

// ── Recording chain ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
    GetAccount(String),
    GetPost(PostRef),
    Vote(VoteOperation),
    Comment(CommentOperation),
}

struct RecordingChain {
    account: Result<AccountSnapshot, String>,
    post: Result<PostSnapshot, String>,
    vote_fails: bool,
    comment_fails: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingChain {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            account: Ok(AccountSnapshot {
                name: "curator".into(),
                voting_power_raw: 9000,
                last_vote_time: now,
                last_post_time: Some(now - Duration::hours(3)),
            }),
            post: Ok(PostSnapshot {
                id: 42,
                created_at: Some(now - Duration::hours(2)),
                voters: BTreeSet::from(["bob".to_string()]),
            }),
            vote_fails: false,
            comment_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn votes(&self) -> Vec<VoteOperation> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Vote(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChainClient for RecordingChain {
    async fn get_account(&self, name: &str) -> Result<AccountSnapshot, RpcError> {
        self.record(Call::GetAccount(name.into()));
        self.account.clone().map_err(|reason| RpcError::Http {
            method: "condenser_api.get_accounts".into(),
            reason,
        })
    }

    async fn get_post(&self, post: &PostRef) -> Result<PostSnapshot, RpcError> {
        self.record(Call::GetPost(post.clone()));
        self.post.clone().map_err(|reason| RpcError::Http {
            method: "condenser_api.get_content".into(),
            reason,
        })
    }

    async fn broadcast_vote(
        &self,
        vote: &VoteOperation,
        _key: &SecretString,
    ) -> Result<(), RpcError> {
        self.record(Call::Vote(vote.clone()));
        if self.vote_fails {
            return Err(RpcError::BroadcastRejected {
                operation: "vote".into(),
                reason: "voting power exhausted at 10.1.2.3".into(),
            });
        }
        Ok(())
    }

    async fn broadcast_comment(
        &self,
        comment: &CommentOperation,
        _key: &SecretString,
    ) -> Result<(), RpcError> {
        self.record(Call::Comment(comment.clone()));
        if self.comment_fails {
            return Err(RpcError::BroadcastRejected {
                operation: "comment".into(),
                reason: "bandwidth exceeded".into(),
            });
        }
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn settings() -> VoteSettings {
    VoteSettings::new("curator", SecretString::from("5Jposting"))
}

async fn run(chain: Arc<RecordingChain>, settings: VoteSettings, params: &[&str]) -> Outcome {
    let env = StepEnv {
        chain,
        settings,
        mention: "@requester".into(),
    };
    let ctx = VoteContext::new(
        params.iter().map(|s| s.to_string()).collect(),
        "user-1",
        fixed_now(),
    );
    upvote_pipeline().run(ctx, &env).await
}

fn rejection_message(outcome: &Outcome) -> &str {
    match outcome {
        Outcome::Rejected(r) => &r.message,
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_url_is_rejected_without_rpc() {
    let chain = Arc::new(RecordingChain::new(fixed_now()));
    let outcome = run(chain.clone(), settings(), &[]).await;

    assert_eq!(outcome.reject_reason(), Some(&RejectReason::BadUrl));
    assert_eq!(
        rejection_message(&outcome),
        messages::upvote_post_url_error("@requester", "$")
    );
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn unparsable_url_is_not_found_without_rpc() {
    let chain = Arc::new(RecordingChain::new(fixed_now()));
    let outcome = run(chain.clone(), settings(), &["https://example.com/no-post-here"]).await;

    assert_eq!(outcome.reject_reason(), Some(&RejectReason::NotFound));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn low_voting_power_reports_exact_values_and_never_votes() {
    let now = fixed_now();
    let mut chain = RecordingChain::new(now);
    chain.account = Ok(AccountSnapshot {
        name: "curator".into(),
        voting_power_raw: 4000,
        last_vote_time: now,
        last_post_time: None,
    });
    let chain = Arc::new(chain);
    let mut s = settings();
    s.min_vp = Some(dec!(60));

    let outcome = run(chain.clone(), s, &[POST_URL]).await;

    assert_eq!(
        outcome.reject_reason(),
        Some(&RejectReason::VpTooLow {
            current: dec!(40),
            threshold: dec!(60)
        })
    );
    let message = rejection_message(&outcome);
    assert!(message.contains("40%"));
    assert!(message.contains("60%"));
    assert_eq!(chain.calls(), vec![Call::GetAccount("curator".into())]);
}

#[tokio::test]
async fn recent_activity_is_too_often() {
    let now = fixed_now();
    let mut chain = RecordingChain::new(now);
    chain.account = Ok(AccountSnapshot {
        name: "curator".into(),
        voting_power_raw: 10_000,
        last_vote_time: now,
        last_post_time: Some(now - Duration::minutes(5)),
    });
    let chain = Arc::new(chain);
    let mut s = settings();
    s.vote_interval = Some(Duration::minutes(30));

    let outcome = run(chain.clone(), s, &[POST_URL]).await;

    assert_eq!(
        outcome.reject_reason(),
        Some(&RejectReason::TooOften {
            last_post: "5 minutes ago".into()
        })
    );
    assert!(rejection_message(&outcome).contains("5 minutes ago"));
    assert!(chain.votes().is_empty());
}

#[tokio::test]
async fn cooldown_passes_after_interval() {
    let chain = Arc::new(RecordingChain::new(fixed_now()));
    let mut s = settings();
    s.vote_interval = Some(Duration::hours(1));

    let outcome = run(chain.clone(), s, &[POST_URL]).await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let mut chain = RecordingChain::new(fixed_now());
    chain.post = Ok(PostSnapshot {
        id: 0,
        created_at: None,
        voters: BTreeSet::new(),
    });
    let chain = Arc::new(chain);

    let outcome = run(chain.clone(), settings(), &[POST_URL]).await;

    assert_eq!(outcome.reject_reason(), Some(&RejectReason::NotFound));
    assert!(chain.votes().is_empty());
}

#[tokio::test]
async fn duplicate_vote_is_rejected() {
    let now = fixed_now();
    let mut chain = RecordingChain::new(now);
    chain.post = Ok(PostSnapshot {
        id: 42,
        created_at: Some(now - Duration::hours(2)),
        voters: BTreeSet::from(["bob".to_string(), "curator".to_string()]),
    });
    let chain = Arc::new(chain);

    let outcome = run(chain.clone(), settings(), &[POST_URL]).await;

    assert_eq!(outcome.reject_reason(), Some(&RejectReason::AlreadyVoted));
    assert!(chain.votes().is_empty());
}

#[tokio::test]
async fn post_age_window_is_enforced() {
    let mut s = settings();
    s.min_post_age = Some(Duration::hours(6));
    let chain = Arc::new(RecordingChain::new(fixed_now()));
    let outcome = run(chain.clone(), s, &[POST_URL]).await;
    assert_eq!(outcome.reject_reason(), Some(&RejectReason::TooEarly));
    assert!(rejection_message(&outcome).contains("at least 6 hours old"));
    assert!(chain.votes().is_empty());

    let mut s = settings();
    s.max_post_age = Some(Duration::minutes(30));
    let chain = Arc::new(RecordingChain::new(fixed_now()));
    let outcome = run(chain.clone(), s, &[POST_URL]).await;
    assert_eq!(outcome.reject_reason(), Some(&RejectReason::TooLate));
    assert!(chain.votes().is_empty());
}

#[tokio::test]
async fn success_casts_exactly_one_vote_with_scaled_weight() {
    let chain = Arc::new(RecordingChain::new(fixed_now()));
    let mut s = settings();
    s.weight = dec!(50.5);

    let outcome = run(chain.clone(), s, &[POST_URL]).await;

    assert!(outcome.is_success());
    assert_eq!(
        chain.votes(),
        vec![VoteOperation {
            voter: "curator".into(),
            author: "alice".into(),
            permlink: "sunset-at-sea".into(),
            weight: 5050,
        }]
    );
    match outcome {
        Outcome::Success(ctx) => {
            assert_eq!(ctx.post_ref(), Some(&PostRef::new("alice", "sunset-at-sea")));
            assert_eq!(ctx.post_snapshot().map(|p| p.id), Some(42));
        }
        other => panic!("Expected Success, got {:?}", other),
    }
}

#[tokio::test]
async fn success_comment_follows_the_vote() {
    let chain = Arc::new(RecordingChain::new(fixed_now()));
    let outcome = run(chain.clone(), settings(), &[POST_URL]).await;
    assert!(outcome.is_success());

    let calls = chain.calls();
    let Some(Call::Comment(comment)) = calls.last() else {
        panic!("Expected a trailing comment call, got {:?}", calls);
    };
    assert!(matches!(calls[calls.len() - 2], Call::Vote(_)));
    assert_eq!(comment.parent_author, "alice");
    assert_eq!(comment.parent_permlink, "sunset-at-sea");
    assert_eq!(comment.author, "curator");
    assert!(comment.permlink.starts_with("re-alice-sunset-at-sea-"));
}

#[tokio::test]
async fn comment_failure_keeps_success() {
    let mut chain = RecordingChain::new(fixed_now());
    chain.comment_fails = true;
    let chain = Arc::new(chain);

    let outcome = run(chain.clone(), settings(), &[POST_URL]).await;

    assert!(outcome.is_success());
    assert_eq!(chain.votes().len(), 1);
}

#[tokio::test]
async fn account_fetch_failure_is_infrastructure_failure() {
    let mut chain = RecordingChain::new(fixed_now());
    chain.account = Err("connection refused by 10.1.2.3".into());
    let chain = Arc::new(chain);
    let mut s = settings();
    s.min_vp = Some(dec!(50));

    let outcome = run(chain.clone(), s, &[POST_URL]).await;

    assert!(matches!(outcome, Outcome::InfrastructureFailure(_)));
    assert!(chain.votes().is_empty());
}

#[tokio::test]
async fn post_fetch_failure_is_infrastructure_failure() {
    let mut chain = RecordingChain::new(fixed_now());
    chain.post = Err("timeout".into());
    let chain = Arc::new(chain);

    let outcome = run(chain.clone(), settings(), &[POST_URL]).await;

    assert!(matches!(outcome, Outcome::InfrastructureFailure(_)));
    assert!(chain.votes().is_empty());
}

#[tokio::test]
async fn rejected_vote_broadcast_is_infrastructure_failure_without_comment() {
    let mut chain = RecordingChain::new(fixed_now());
    chain.vote_fails = true;
    let chain = Arc::new(chain);

    let outcome = run(chain.clone(), settings(), &[POST_URL]).await;

    assert!(matches!(outcome, Outcome::InfrastructureFailure(_)));
    assert_eq!(chain.votes().len(), 1);
    let calls = chain.calls();
    assert!(matches!(calls.last(), Some(Call::Vote(_))));
    assert!(!calls.iter().any(|c| matches!(c, Call::Comment(_))));
}

#[tokio::test]
async fn same_inputs_give_same_outcome() {
    let mut s = settings();
    s.min_vp = Some(dec!(80));
    s.vote_interval = Some(Duration::hours(1));

    let first = run(Arc::new(RecordingChain::new(fixed_now())), s.clone(), &[POST_URL]).await;
    let second = run(Arc::new(RecordingChain::new(fixed_now())), s, &[POST_URL]).await;

    match (first, second) {
        (Outcome::Success(a), Outcome::Success(b)) => assert_eq!(a, b),
        other => panic!("Expected two successes, got {:?}", other),
    }
}

// ── Through the command layer ───────────────────────────────────────

#[tokio::test]
async fn upvote_command_hides_infrastructure_cause() {
    let mut chain = RecordingChain::new(fixed_now());
    chain.post = Err("connection refused by 10.1.2.3".into());
    let command = UpvoteCommand::new(Arc::new(chain), SettingsStore::new(settings()));

    let reply = command
        .execute(&Invocation {
            command: "upvote".into(),
            params: vec![POST_URL.into()],
            user_id: "user-1".into(),
            mention: "@requester".into(),
            invoked_at: fixed_now(),
        })
        .await
        .unwrap();

    assert_eq!(reply, messages::system_error("@requester"));
    assert!(!reply.contains("10.1.2.3"));
}

#[tokio::test]
async fn upvote_command_reports_rejected_vote_as_system_error() {
    let mut chain = RecordingChain::new(fixed_now());
    chain.vote_fails = true;
    let chain = Arc::new(chain);
    let command = UpvoteCommand::new(chain.clone(), SettingsStore::new(settings()));

    let reply = command
        .execute(&Invocation {
            command: "upvote".into(),
            params: vec![POST_URL.into()],
            user_id: "user-1".into(),
            mention: "@requester".into(),
            invoked_at: fixed_now(),
        })
        .await
        .unwrap();

    assert_eq!(reply, messages::system_error("@requester"));
    assert!(!reply.contains("10.1.2.3"));
    assert!(!chain.calls().iter().any(|c| matches!(c, Call::Comment(_))));
}

#[tokio::test]
async fn upvote_command_reports_success() {
    let command = UpvoteCommand::new(
        Arc::new(RecordingChain::new(fixed_now())),
        SettingsStore::new(settings()),
    );
    let reply = command
        .execute(&Invocation {
            command: "vote".into(),
            params: vec![POST_URL.into()],
            user_id: "user-1".into(),
            mention: "@requester".into(),
            invoked_at: fixed_now(),
        })
        .await
        .unwrap();
    assert_eq!(reply, messages::upvote_success("@requester", "curator"));
}

struct NullChannel;

#[async_trait]
impl Channel for NullChannel {
    fn name(&self) -> &str {
        "null"
    }
    async fn start(&self) -> Result<MessageStream, ChannelError> {
        Ok(Box::pin(futures::stream::empty()))
    }
    async fn respond(
        &self,
        _msg: &IncomingMessage,
        _response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[tokio::test]
async fn bot_routes_vote_alias_to_pipeline() {
    let chain = Arc::new(RecordingChain::new(Utc::now()));
    let settings = SettingsStore::new(settings());
    let registry = CommandRegistry::builtin(chain.clone(), Arc::clone(&settings));
    let bot = Bot::new(Arc::new(NullChannel), Arc::new(registry), settings);

    let msg = IncomingMessage::new("null", "user-1", format!("$vote {POST_URL}"))
        .with_user_name("Requester");
    let reply = bot.handle_message(&msg).await.unwrap();

    assert_eq!(reply, messages::upvote_success("Requester", "curator"));
    assert_eq!(chain.votes().len(), 1);
}
