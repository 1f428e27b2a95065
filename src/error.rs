//! Error types for the upvote bot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Config parameter \"{0}\" cannot be changed")]
    Immutable(String),

    #[error("Unknown config parameter \"{0}\"")]
    UnknownParameter(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Errors raised by the remote content platform client.
///
/// These are opaque causes: the pipeline never inspects them beyond logging.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP error calling {method}: {reason}")]
    Http { method: String, reason: String },

    #[error("Node returned an error for {method}: {message}")]
    Remote { method: String, message: String },

    #[error("Invalid response for {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("Account {0} not found")]
    AccountNotFound(String),

    #[error("Broadcast of {operation} rejected: {reason}")]
    BroadcastRejected { operation: String, reason: String },
}

/// Infrastructure failures inside the vote pipeline.
///
/// Business-rule rejections are not errors; see `pipeline::outcome`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Step {step} ran before {field} was available")]
    MissingContext {
        step: &'static str,
        field: &'static str,
    },

    #[error("RPC failure in step {step}: {source}")]
    Rpc {
        step: &'static str,
        #[source]
        source: RpcError,
    },

    #[error("Invalid vote weight {0}")]
    InvalidWeight(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
