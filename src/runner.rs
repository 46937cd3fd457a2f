//! Operation runner
//!
//! Executes one [`OperationRequest`] end to end: chain lookups, payload
//! construction and submission through a [`Submitter`].

use crate::config::SuiConfig;
use crate::sui::{
    format_sui, get_owned_sui_coins, get_self_stakes, resolve_operator_capability, send_sui,
    set_commission_rate, set_gas_price, withdraw_stake, ChainClient, PendingTransaction,
    Submitter, SuiAddress, TransactionReceipt,
};
use crate::wallet::SuiSigner;
use crate::{Error, Result};
use serde::Serialize;
use tracing::{info, warn};

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    /// Withdraw every stake the signer holds with the configured validator
    Withdraw,
    Send {
        amount_mist: u64,
        recipient: SuiAddress,
    },
    SetGasPrice {
        price: u64,
        validator: Option<SuiAddress>,
    },
    SetCommissionRate {
        rate: u64,
        validator: Option<SuiAddress>,
    },
}

impl OperationRequest {
    /// Question to put to the operator before running, for irreversible
    /// transfers of funds
    pub fn confirmation_prompt(&self) -> Option<String> {
        match self {
            OperationRequest::Withdraw => {
                Some("You're about to withdraw all staked SUI objects. Proceed?".to_string())
            }
            OperationRequest::Send {
                amount_mist,
                recipient,
            } => Some(format!(
                "You're about to send {} SUI to address {}. Proceed?",
                format_sui(*amount_mist),
                recipient
            )),
            OperationRequest::SetGasPrice { .. } | OperationRequest::SetCommissionRate { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationRequest::Withdraw => "withdraw",
            OperationRequest::Send { .. } => "send",
            OperationRequest::SetGasPrice { .. } => "update-gas-price",
            OperationRequest::SetCommissionRate { .. } => "update-commission-rate",
        }
    }
}

/// Receipts of a completed operation
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Many(Vec<TransactionReceipt>),
    Single(TransactionReceipt),
}

impl OperationResult {
    pub fn receipts(&self) -> &[TransactionReceipt] {
        match self {
            OperationResult::Many(receipts) => receipts,
            OperationResult::Single(receipt) => std::slice::from_ref(receipt),
        }
    }
}

/// Runs requests for one signer against one chain
pub struct OperationRunner<'a> {
    client: &'a dyn ChainClient,
    signer: &'a SuiSigner,
    config: &'a SuiConfig,
}

impl<'a> OperationRunner<'a> {
    pub fn new(client: &'a dyn ChainClient, signer: &'a SuiSigner, config: &'a SuiConfig) -> Self {
        Self {
            client,
            signer,
            config,
        }
    }

    fn submitter(&self) -> Submitter<'a> {
        Submitter::new(
            self.client,
            self.signer,
            self.config.submission_delay,
            self.config.gas_budget,
        )
    }

    pub async fn run(&self, request: OperationRequest) -> Result<OperationResult> {
        info!(
            operation = request.name(),
            signer = %self.signer.address(),
            "Running operation"
        );

        match request {
            OperationRequest::Withdraw => self.withdraw().await.map(OperationResult::Many),
            OperationRequest::Send {
                amount_mist,
                recipient,
            } => self
                .send(amount_mist, &recipient)
                .await
                .map(OperationResult::Single),
            OperationRequest::SetGasPrice { price, validator } => self
                .set_gas_price(price, validator.as_ref())
                .await
                .map(OperationResult::Single),
            OperationRequest::SetCommissionRate { rate, validator } => self
                .set_commission_rate(rate, validator.as_ref())
                .await
                .map(OperationResult::Single),
        }
    }

    async fn withdraw(&self) -> Result<Vec<TransactionReceipt>> {
        let owner = self.signer.address();
        let validator = self.config.validator_address.as_ref().unwrap_or(owner);

        let stakes = get_self_stakes(self.client, owner, validator).await?;
        if stakes.is_empty() {
            warn!(owner = %owner, validator = %validator, "No stakes to withdraw");
            return Ok(Vec::new());
        }

        info!(count = stakes.len(), validator = %validator, "Withdrawing stakes");
        let pending = stakes
            .iter()
            .map(|stake| {
                PendingTransaction::new(
                    format!("withdraw stake {}", stake.staked_sui_id),
                    withdraw_stake(stake),
                )
            })
            .collect();

        self.submitter().submit_all(pending).await
    }

    async fn send(&self, amount_mist: u64, recipient: &SuiAddress) -> Result<TransactionReceipt> {
        if amount_mist == 0 {
            return Err(Error::InvalidArgument(
                "amount must be greater than zero".to_string(),
            ));
        }

        let coins = get_owned_sui_coins(self.client, self.signer.address()).await?;
        let balance: u64 = coins
            .iter()
            .filter_map(|c| c.balance_mist())
            .fold(0u64, u64::saturating_add);
        if balance < amount_mist {
            return Err(Error::InvalidArgument(format!(
                "insufficient balance: {} SUI available, {} SUI requested",
                format_sui(balance),
                format_sui(amount_mist)
            )));
        }

        let payload = send_sui(&coins, recipient, amount_mist)?;
        self.submitter()
            .submit_one(PendingTransaction::new(
                format!("send {} SUI to {}", format_sui(amount_mist), recipient),
                payload,
            ))
            .await
    }

    async fn set_gas_price(
        &self,
        price: u64,
        validator: Option<&SuiAddress>,
    ) -> Result<TransactionReceipt> {
        let cap =
            resolve_operator_capability(self.client, self.signer.address(), validator).await?;
        self.submitter()
            .submit_one(PendingTransaction::new(
                "update reference gas price",
                set_gas_price(&cap, price),
            ))
            .await
    }

    async fn set_commission_rate(
        &self,
        rate: u64,
        validator: Option<&SuiAddress>,
    ) -> Result<TransactionReceipt> {
        // The holder must own a cap for the target validator even though the
        // commission call itself takes no cap argument.
        resolve_operator_capability(self.client, self.signer.address(), validator).await?;
        self.submitter()
            .submit_one(PendingTransaction::new(
                "update commission rate",
                set_commission_rate(rate),
            ))
            .await
    }
}
