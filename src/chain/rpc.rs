//! JSON-RPC client for the content platform.
//!
//! Reads go to a public node (`condenser_api`). Signing is outside this
//! crate: vote and comment operations are posted together with the posting
//! key to a broadcast gateway that signs and relays them.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::chain::types::{
    AccountSnapshot, ChainClient, CommentOperation, PostRef, PostSnapshot, VoteOperation,
};
use crate::config::RpcConfig;
use crate::error::RpcError;

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

/// Content platform client over HTTP.
pub struct JsonRpcClient {
    node_url: String,
    broadcast_url: String,
    client: reqwest::Client,
}

impl JsonRpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RpcError::Http {
                method: "client".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            node_url: config.node_url.clone(),
            broadcast_url: config.broadcast_url.clone(),
            client,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        debug!(method, "Calling node");

        let resp = self
            .client
            .post(&self.node_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Http {
                method: method.into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(RpcError::Http {
                method: method.into(),
                reason: format!("node returned {}", resp.status()),
            });
        }

        let envelope: RpcResponse<T> =
            resp.json().await.map_err(|e| RpcError::InvalidResponse {
                method: method.into(),
                reason: e.to_string(),
            })?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Remote {
                method: method.into(),
                message: error.message,
            });
        }
        envelope.result.ok_or_else(|| RpcError::InvalidResponse {
            method: method.into(),
            reason: "response has neither result nor error".into(),
        })
    }

    async fn broadcast(
        &self,
        operation: &str,
        payload: serde_json::Value,
        key: &SecretString,
    ) -> Result<(), RpcError> {
        let body = serde_json::json!({
            "operation": operation,
            "payload": payload,
            "wif": key.expose_secret(),
        });

        let resp = self
            .client
            .post(&self.broadcast_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Http {
                method: format!("broadcast {operation}"),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            debug!(operation, "Broadcast accepted");
            return Ok(());
        }

        let status = resp.status();
        let reason = resp.text().await.unwrap_or_default();
        Err(RpcError::BroadcastRejected {
            operation: operation.into(),
            reason: format!("{status}: {reason}"),
        })
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn get_account(&self, name: &str) -> Result<AccountSnapshot, RpcError> {
        let accounts: Vec<AccountSnapshot> = self
            .call("condenser_api.get_accounts", serde_json::json!([[name]]))
            .await?;
        accounts
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| RpcError::AccountNotFound(name.into()))
    }

    async fn get_post(&self, post: &PostRef) -> Result<PostSnapshot, RpcError> {
        self.call(
            "condenser_api.get_content",
            serde_json::json!([post.author, post.permlink]),
        )
        .await
    }

    async fn broadcast_vote(
        &self,
        vote: &VoteOperation,
        key: &SecretString,
    ) -> Result<(), RpcError> {
        let payload = serde_json::to_value(vote).map_err(|e| RpcError::InvalidResponse {
            method: "broadcast vote".into(),
            reason: e.to_string(),
        })?;
        self.broadcast("vote", payload, key).await
    }

    async fn broadcast_comment(
        &self,
        comment: &CommentOperation,
        key: &SecretString,
    ) -> Result<(), RpcError> {
        let payload = serde_json::to_value(comment).map_err(|e| RpcError::InvalidResponse {
            method: "broadcast comment".into(),
            reason: e.to_string(),
        })?;
        self.broadcast("comment", payload, key).await
    }
}
