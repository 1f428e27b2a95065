//! Remote content platform access.
//!
//! The platform is consumed through the [`ChainClient`] trait so the vote
//! pipeline can be driven by the JSON-RPC client in production and by
//! scripted stubs in tests.

pub mod power;
pub mod rpc;
pub mod types;
pub mod url;

pub use rpc::JsonRpcClient;
pub use types::*;
