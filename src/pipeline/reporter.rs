//! Turn a pipeline outcome into the chat reply.

use crate::messages;
use crate::pipeline::outcome::Outcome;

/// Render the reply for `outcome`.
///
/// Infrastructure failures get a generic message. Their cause stays in the
/// logs.
pub fn render(outcome: &Outcome, who: &str, voter: &str) -> String {
    match outcome {
        Outcome::Success(_) => messages::upvote_success(who, voter),
        Outcome::Rejected(rejection) => rejection.message.clone(),
        Outcome::InfrastructureFailure(_) => messages::system_error(who),
    }
}
