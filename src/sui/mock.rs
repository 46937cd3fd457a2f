//! In-memory chain used by unit tests

use crate::sui::client::{ChainClient, RpcError};
use crate::sui::operations::{CallArg, Payload};
use crate::sui::types::{
    Coin, DelegatedStake, ObjectContent, ObjectData, ObjectId, OwnedObject, Page, Stake,
    SuiAddress, TransactionReceipt, SUI_COIN_TYPE,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct BuiltCall {
    pub sender: SuiAddress,
    pub payload: Payload,
    pub gas_budget: u64,
}

#[derive(Debug, Clone)]
pub struct ExecutedCall {
    pub digest: String,
    pub payload: Payload,
    /// Staked object withdrawn by this call, if it is a withdrawal
    pub stake_id: Option<ObjectId>,
    pub tx_bytes: Vec<u8>,
    pub signature: String,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    built: Vec<BuiltCall>,
    executed: Vec<ExecutedCall>,
    attempts: usize,
}

#[derive(Default)]
pub struct MockChain {
    stakes: Vec<DelegatedStake>,
    coin_pages: Vec<Vec<Coin>>,
    object_pages: Vec<Vec<OwnedObject>>,
    fail_at: Option<usize>,
    state: Mutex<State>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stakes(mut self, stakes: Vec<DelegatedStake>) -> Self {
        self.stakes = stakes;
        self
    }

    pub fn with_coin_pages(mut self, pages: Vec<Vec<Coin>>) -> Self {
        self.coin_pages = pages;
        self
    }

    pub fn with_object_pages(mut self, pages: Vec<Vec<OwnedObject>>) -> Self {
        self.object_pages = pages;
        self
    }

    /// Reject the `attempt`-th execution (1-based)
    pub fn failing_execution_at(mut self, attempt: usize) -> Self {
        self.fail_at = Some(attempt);
        self
    }

    pub fn built(&self) -> Vec<BuiltCall> {
        self.state.lock().unwrap().built.clone()
    }

    pub fn executed(&self) -> Vec<ExecutedCall> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn execution_attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    pub fn stake(id: u8) -> Stake {
        Stake {
            staked_sui_id: ObjectId::from_short(id),
            stake_request_epoch: Some("1".to_string()),
            stake_active_epoch: Some("2".to_string()),
            principal: Some("1000000000".to_string()),
            status: Some("Active".to_string()),
            estimated_reward: None,
        }
    }

    pub fn coin(id: u8, balance: u64) -> Coin {
        Coin {
            coin_type: SUI_COIN_TYPE.to_string(),
            coin_object_id: ObjectId::from_short(id),
            version: "1".to_string(),
            digest: format!("coin-{}", id),
            balance: balance.to_string(),
        }
    }

    pub fn operation_cap(id: u8, authorizer: &str) -> OwnedObject {
        let object_id = ObjectId::from_short(id);
        OwnedObject {
            data: Some(ObjectData {
                object_id: object_id.clone(),
                version: "1".to_string(),
                digest: format!("cap-{}", id),
                object_type: Some(crate::sui::VALIDATOR_OPERATION_CAP_TYPE.to_string()),
                content: Some(ObjectContent {
                    data_type: "moveObject".to_string(),
                    object_type: Some(crate::sui::VALIDATOR_OPERATION_CAP_TYPE.to_string()),
                    has_public_transfer: false,
                    fields: json!({
                        "authorizer_validator_address": authorizer,
                        "id": { "id": object_id.as_str() }
                    }),
                }),
            }),
            error: None,
        }
    }
}

fn page_at<T: Clone>(pages: &[Vec<T>], cursor: Option<&str>) -> Result<Page<T>, RpcError> {
    let index = match cursor {
        None => 0,
        Some(c) => c.parse::<usize>().map_err(|_| RpcError::InvalidResponse {
            method: "mock",
            reason: format!("unknown cursor {}", c),
        })?,
    };
    let has_next_page = index + 1 < pages.len();
    Ok(Page {
        data: pages.get(index).cloned().unwrap_or_default(),
        next_cursor: has_next_page.then(|| (index + 1).to_string()),
        has_next_page,
    })
}

fn withdrawn_stake(payload: &Payload) -> Option<ObjectId> {
    match payload {
        Payload::MoveCall(call) if call.function == "request_withdraw_stake" => {
            match call.arguments.get(1) {
                Some(CallArg::Object(id)) => Some(id.clone()),
                _ => None,
            }
        }
        _ => None,
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_stakes(&self, _owner: &SuiAddress) -> Result<Vec<DelegatedStake>, RpcError> {
        Ok(self.stakes.clone())
    }

    async fn get_owned_objects(
        &self,
        _owner: &SuiAddress,
        _struct_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<OwnedObject>, RpcError> {
        page_at(&self.object_pages, cursor)
    }

    async fn get_coins(
        &self,
        _owner: &SuiAddress,
        _coin_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Coin>, RpcError> {
        page_at(&self.coin_pages, cursor)
    }

    async fn build_transaction(
        &self,
        sender: &SuiAddress,
        payload: &Payload,
        gas_budget: u64,
    ) -> Result<Vec<u8>, RpcError> {
        let mut state = self.state.lock().unwrap();
        let index = state.built.len();
        state.built.push(BuiltCall {
            sender: sender.clone(),
            payload: payload.clone(),
            gas_budget,
        });
        Ok(format!("tx:{}", index).into_bytes())
    }

    async fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signature: &str,
    ) -> Result<TransactionReceipt, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;
        let digest = format!("digest-{}", state.attempts);

        if self.fail_at == Some(state.attempts) {
            return Err(RpcError::Rejected {
                digest,
                reason: "MoveAbort".to_string(),
            });
        }

        let index = std::str::from_utf8(tx_bytes)
            .ok()
            .and_then(|s| s.strip_prefix("tx:"))
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| RpcError::InvalidResponse {
                method: "mock",
                reason: "transaction was not built by this chain".to_string(),
            })?;
        let payload = state.built[index].payload.clone();

        state.executed.push(ExecutedCall {
            digest: digest.clone(),
            stake_id: withdrawn_stake(&payload),
            payload,
            tx_bytes: tx_bytes.to_vec(),
            signature: signature.to_string(),
            at: Instant::now(),
        });

        Ok(TransactionReceipt {
            digest: digest.clone(),
            status: "success".to_string(),
            error: None,
            response: json!({
                "digest": digest,
                "effects": { "status": { "status": "success" } }
            }),
        })
    }
}
