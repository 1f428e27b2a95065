//! Upvote bot: chat commands that vote for posts on a blockchain content platform.

pub mod bot;
pub mod chain;
pub mod channels;
pub mod commands;
pub mod config;
pub mod error;
pub mod humanize;
pub mod logging;
pub mod messages;
pub mod pipeline;
