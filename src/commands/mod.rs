//! Chat commands.
//!
//! A message starting with the command prefix is split on whitespace: the
//! first word names the command (or one of its aliases), the rest are its
//! parameters.

pub mod command;
pub mod config;
pub mod help;
pub mod owner;
pub mod registry;
pub mod upvote;

pub use command::*;
pub use config::ConfigCommand;
pub use help::HelpCommand;
pub use owner::OwnerCommand;
pub use registry::CommandRegistry;
pub use upvote::UpvoteCommand;
