//! User-facing message templates.
//!
//! Every reply starts with the requester's mention so it reads naturally in
//! group chats.

use std::fmt::Display;

pub fn info(who: &str, voter: &str, prefix: &str) -> String {
    format!(
        "{who}, I upvote posts on behalf of *{voter}*.\n\
         Commands:\n\
         `{prefix}upvote <post url>` (alias `{prefix}vote`): vote for a post\n\
         `{prefix}owner`: list bot administrators\n\
         `{prefix}config [name] [value]`: show or change settings (admins only)\n\
         `{prefix}help` (alias `{prefix}info`): this message"
    )
}

pub fn unsupported_command(who: &str, prefix: &str, command: &str) -> String {
    format!(
        "{who}, command `{prefix}{command}` is not supported. Try `{prefix}help` for the list of commands."
    )
}

pub fn permission_denied(who: &str, prefix: &str, command: &str) -> String {
    format!("{who}, you don't have permission to run `{prefix}{command}`.")
}

pub fn system_error(who: &str) -> String {
    format!("{who}, something went wrong on our side. Please try again later.")
}

pub fn owner_info(who: &str, admins: &str) -> String {
    if admins.is_empty() {
        format!("{who}, this bot has no administrators configured.")
    } else {
        format!("{who}, this bot is managed by {admins}.")
    }
}

// ── Upvote ──────────────────────────────────────────────────────────

pub fn upvote_post_url_error(who: &str, prefix: &str) -> String {
    format!("{who}, please give me a post URL: `{prefix}upvote <post url>`.")
}

pub fn upvote_post_not_found(who: &str, prefix: &str) -> String {
    format!(
        "{who}, I couldn't find that post. Check the link and try `{prefix}upvote <post url>` again."
    )
}

pub fn upvote_vp_too_low(
    who: &str,
    voter: &str,
    current: impl Display,
    min: impl Display,
) -> String {
    format!("{who}, *{voter}* is resting: voting power is {current}% and votes resume at {min}%.")
}

pub fn upvote_too_often(who: &str, last_post: &str) -> String {
    format!("{who}, the last vote was {last_post}. Please wait a bit before asking again.")
}

pub fn upvote_already_voted(who: &str, voter: &str) -> String {
    format!("{who}, *{voter}* has already voted for this post.")
}

pub fn upvote_too_early(who: &str, window: &str) -> String {
    format!("{who}, this post is too new. Posts must be {window}.")
}

pub fn upvote_too_late(who: &str, window: &str) -> String {
    format!("{who}, this post is too old. Posts must be {window}.")
}

/// Describe the accepted post age window, e.g. `between 30 minutes and 6 days old`.
pub fn post_age_window(min_age: Option<&str>, max_age: Option<&str>) -> String {
    match (min_age, max_age) {
        (Some(min), Some(max)) => format!("between {min} and {max} old"),
        (Some(min), None) => format!("at least {min} old"),
        (None, Some(max)) => format!("at most {max} old"),
        (None, None) => "of any age".to_string(),
    }
}

pub fn upvote_success(who: &str, voter: &str) -> String {
    format!("{who}, done! *{voter}* upvoted your post.")
}

// ── Config ──────────────────────────────────────────────────────────

pub fn config_info(who: &str, prefix: &str, parameters: &[&str]) -> String {
    format!(
        "{who}, usage: `{prefix}config <name>` shows a value, `{prefix}config <name> <value>` changes it.\n\
         Parameters: {}",
        parameters.join(", ")
    )
}

pub fn config_value(who: &str, name: &str, value: &serde_json::Value) -> String {
    format!("{who}, `{name}` is `{value}`.")
}

pub fn config_value_changed(who: &str, name: &str, value: &serde_json::Value) -> String {
    format!("{who}, `{name}` is now `{value}`.")
}

pub fn config_value_error(who: &str, name: &str, error: impl Display) -> String {
    format!("{who}, couldn't change `{name}`: {error}.")
}

pub fn config_unknown_parameter(who: &str, name: &str) -> String {
    format!("{who}, there is no config parameter `{name}`.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voter_is_bold_in_legacy_markdown() {
        let replies = [
            info("@bob", "curator", "$"),
            upvote_vp_too_low("@bob", "curator", "40", "60"),
            upvote_already_voted("@bob", "curator"),
            upvote_success("@bob", "curator"),
        ];
        for reply in replies {
            assert!(reply.contains("*curator*"), "{reply}");
            assert!(!reply.contains("**"), "{reply}");
        }
    }

    #[test]
    fn age_window_phrases() {
        assert_eq!(post_age_window(Some("1 hour"), None), "at least 1 hour old");
        assert_eq!(post_age_window(None, None), "of any age");
    }
}
