//! Post URL parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::chain::types::PostRef;

/// `scheme://host[/category...]/@author/permlink[/][?query][#fragment]`.
///
/// Account names are 3 to 16 lowercase characters; permlinks are lowercase
/// alphanumerics and dashes. Matching is case-sensitive.
static POST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://[^/\s]+(?:/[^/\s@?#]+)*/@([a-z0-9][a-z0-9.\-]{2,15})/([a-z0-9][a-z0-9\-]{0,254})/?(?:[?#]\S*)?$",
    )
    .expect("post URL pattern is valid")
});

/// Extract author and permlink from a post URL, or `None` if it has another shape.
pub fn parse_post_url(url: &str) -> Option<PostRef> {
    let caps = POST_URL.captures(url.trim())?;
    Some(PostRef::new(&caps[1], &caps[2]))
}
