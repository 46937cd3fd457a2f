//! Sui fullnode JSON-RPC client
//!
//! Transactions are built by the fullnode (`unsafe_moveCall`,
//! `unsafe_paySui`), signed locally by [`SuiSigner`](crate::wallet::SuiSigner)
//! and executed with `sui_executeTransactionBlock`. The node never sees the key.

use crate::sui::operations::{MoveCall, PaySui, Payload};
use crate::sui::types::{Coin, DelegatedStake, OwnedObject, Page, SuiAddress, TransactionReceipt};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

/// Error type for chain RPC failures
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("{method} request failed: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} returned error {code}: {message}")]
    Server {
        method: &'static str,
        code: i64,
        message: String,
    },

    #[error("{method} returned no result")]
    EmptyResult { method: &'static str },

    #[error("unexpected {method} response: {reason}")]
    InvalidResponse { method: &'static str, reason: String },

    #[error("transaction {digest} failed on chain: {reason}")]
    Rejected { digest: String, reason: String },
}

/// Operations the toolkit needs from a Sui fullnode
///
/// Pagination is left to callers so cursor handling can be tested against
/// in-memory implementations.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// All stakes owned by `owner`, grouped by validator
    async fn get_stakes(&self, owner: &SuiAddress) -> Result<Vec<DelegatedStake>, RpcError>;

    /// One page of objects of `struct_type` owned by `owner`, with content
    async fn get_owned_objects(
        &self,
        owner: &SuiAddress,
        struct_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<OwnedObject>, RpcError>;

    /// One page of coins of `coin_type` owned by `owner`
    async fn get_coins(
        &self,
        owner: &SuiAddress,
        coin_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Coin>, RpcError>;

    /// Build BCS `TransactionData` bytes for a payload
    async fn build_transaction(
        &self,
        sender: &SuiAddress,
        payload: &Payload,
        gas_budget: u64,
    ) -> Result<Vec<u8>, RpcError>;

    /// Execute signed transaction bytes and wait for local execution
    async fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signature: &str,
    ) -> Result<TransactionReceipt, RpcError>;
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBlockBytes {
    tx_bytes: String,
}

/// JSON-RPC client for a single fullnode
pub struct SuiRpcClient {
    client: Client,
    url: Url,
}

impl SuiRpcClient {
    pub fn new(url: Url) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, RpcError> {
        tracing::debug!(method, "Sui RPC call");

        let response = self
            .client
            .post(self.url.clone())
            .json(&request_body(method, params))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| RpcError::Http { method, source })?;

        let body: JsonRpcResponse<Value> = response
            .json()
            .await
            .map_err(|source| RpcError::Http { method, source })?;

        rpc_result(method, body)
    }
}

/// Unwrap a JSON-RPC envelope into the typed `result`
fn rpc_result<T: DeserializeOwned>(
    method: &'static str,
    body: JsonRpcResponse<Value>,
) -> Result<T, RpcError> {
    if let Some(error) = body.error {
        return Err(RpcError::Server {
            method,
            code: error.code,
            message: error.message,
        });
    }

    let result = body.result.ok_or(RpcError::EmptyResult { method })?;
    serde_json::from_value(result).map_err(|e| RpcError::InvalidResponse {
        method,
        reason: e.to_string(),
    })
}

fn request_body(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": uuid::Uuid::new_v4().to_string(),
        "method": method,
        "params": params,
    })
}

fn move_call_params(sender: &SuiAddress, call: &MoveCall, gas_budget: u64) -> Value {
    let arguments: Vec<Value> = call.arguments.iter().map(|a| a.to_json()).collect();
    json!([
        sender.as_str(),
        call.package.as_str(),
        call.module,
        call.function,
        call.type_arguments,
        arguments,
        Value::Null,
        gas_budget.to_string(),
    ])
}

fn pay_sui_params(sender: &SuiAddress, pay: &PaySui, gas_budget: u64) -> Value {
    let input_coins: Vec<&str> = pay.input_coins.iter().map(|c| c.as_str()).collect();
    json!([
        sender.as_str(),
        input_coins,
        [pay.recipient.as_str()],
        [pay.amount.to_string()],
        gas_budget.to_string(),
    ])
}

/// Turn a `sui_executeTransactionBlock` response into a receipt, treating a
/// `failure` effects status as a rejection.
pub(crate) fn parse_receipt(response: Value) -> Result<TransactionReceipt, RpcError> {
    const METHOD: &str = "sui_executeTransactionBlock";

    let digest = response
        .get("digest")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::InvalidResponse {
            method: METHOD,
            reason: "missing transaction digest".to_string(),
        })?
        .to_string();

    let status = response
        .pointer("/effects/status")
        .ok_or_else(|| RpcError::InvalidResponse {
            method: METHOD,
            reason: format!("missing effects for transaction {}", digest),
        })?;
    let state = status
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let error = status
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string);

    if state != "success" {
        return Err(RpcError::Rejected {
            digest,
            reason: error.unwrap_or(state),
        });
    }

    Ok(TransactionReceipt {
        digest,
        status: state,
        error,
        response,
    })
}

#[async_trait]
impl ChainClient for SuiRpcClient {
    async fn get_stakes(&self, owner: &SuiAddress) -> Result<Vec<DelegatedStake>, RpcError> {
        self.call("suix_getStakes", json!([owner.as_str()])).await
    }

    async fn get_owned_objects(
        &self,
        owner: &SuiAddress,
        struct_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<OwnedObject>, RpcError> {
        let query = json!({
            "filter": { "StructType": struct_type },
            "options": { "showType": true, "showContent": true }
        });
        self.call(
            "suix_getOwnedObjects",
            json!([owner.as_str(), query, cursor, Value::Null]),
        )
        .await
    }

    async fn get_coins(
        &self,
        owner: &SuiAddress,
        coin_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Coin>, RpcError> {
        self.call(
            "suix_getCoins",
            json!([owner.as_str(), coin_type, cursor, Value::Null]),
        )
        .await
    }

    async fn build_transaction(
        &self,
        sender: &SuiAddress,
        payload: &Payload,
        gas_budget: u64,
    ) -> Result<Vec<u8>, RpcError> {
        let (method, params) = match payload {
            Payload::MoveCall(call) => ("unsafe_moveCall", move_call_params(sender, call, gas_budget)),
            Payload::PaySui(pay) => ("unsafe_paySui", pay_sui_params(sender, pay, gas_budget)),
        };

        let built: TransactionBlockBytes = self.call(method, params).await?;
        STANDARD
            .decode(&built.tx_bytes)
            .map_err(|e| RpcError::InvalidResponse {
                method,
                reason: format!("txBytes is not valid base64: {}", e),
            })
    }

    async fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signature: &str,
    ) -> Result<TransactionReceipt, RpcError> {
        let response: Value = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    STANDARD.encode(tx_bytes),
                    [signature],
                    { "showEffects": true, "showBalanceChanges": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;
        parse_receipt(response)
    }
}
