//! Sui chain access: types, JSON-RPC client, payload builders, capability
//! lookup and the submission pipeline.

mod capability;
mod client;
mod operations;
mod query;
mod submitter;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use capability::{
    capability_target, find_operator_capability, resolve_operator_capability,
    VALIDATOR_OPERATION_CAP_TYPE,
};
pub use client::{ChainClient, RpcError, SuiRpcClient};
pub use operations::{
    format_sui, parse_sui_amount, send_sui, set_commission_rate, set_gas_price, withdraw_stake,
    CallArg, MoveCall, PaySui, Payload, COMMISSION_RATE_GAS_BUDGET,
};
pub use query::{collect_pages, get_owned_objects_of_type, get_owned_sui_coins, get_self_stakes};
pub use submitter::{PendingTransaction, Submitter, DEFAULT_SUBMISSION_DELAY};
pub use types::{
    Coin, DelegatedStake, ObjectId, OwnedObject, Page, Stake, SuiAddress, TransactionReceipt,
    MIST_PER_SUI, SUI_COIN_TYPE,
};
