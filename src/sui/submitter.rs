//! Transaction submission pipeline
//!
//! Submissions are strictly sequential. Consecutive transactions are spaced
//! by a fixed delay so the network can process them one after another, and
//! the first failure stops the run. Landed transactions cannot be rolled back.

use crate::sui::client::{ChainClient, RpcError};
use crate::sui::operations::Payload;
use crate::sui::types::TransactionReceipt;
use crate::wallet::SuiSigner;
use crate::{Error, Result};
use std::time::Duration;

/// Default spacing between consecutive submissions
pub const DEFAULT_SUBMISSION_DELAY: Duration = Duration::from_millis(3000);

/// A payload together with a description of what it does, for errors and logs
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub context: String,
    pub payload: Payload,
}

impl PendingTransaction {
    pub fn new(context: impl Into<String>, payload: Payload) -> Self {
        Self {
            context: context.into(),
            payload,
        }
    }
}

/// Builds, signs and executes payloads for one signer
pub struct Submitter<'a> {
    client: &'a dyn ChainClient,
    signer: &'a SuiSigner,
    delay: Duration,
    default_gas_budget: u64,
}

impl<'a> Submitter<'a> {
    pub fn new(
        client: &'a dyn ChainClient,
        signer: &'a SuiSigner,
        delay: Duration,
        default_gas_budget: u64,
    ) -> Self {
        Self {
            client,
            signer,
            delay,
            default_gas_budget,
        }
    }

    /// Submit a single transaction
    pub async fn submit_one(&self, tx: PendingTransaction) -> Result<TransactionReceipt> {
        self.submit(&tx.payload)
            .await
            .map_err(|source| Error::SubmissionFailed {
                context: tx.context,
                completed: 0,
                source,
            })
    }

    /// Submit transactions in order, pausing between them.
    ///
    /// Stops at the first failure; the error reports how many transactions
    /// had already landed.
    pub async fn submit_all(&self, txs: Vec<PendingTransaction>) -> Result<Vec<TransactionReceipt>> {
        let total = txs.len();
        let mut receipts = Vec::with_capacity(total);

        for (index, tx) in txs.into_iter().enumerate() {
            if index > 0 {
                tracing::debug!(
                    delay_ms = self.delay.as_millis() as u64,
                    "Waiting before next submission"
                );
                tokio::time::sleep(self.delay).await;
            }

            match self.submit(&tx.payload).await {
                Ok(receipt) => {
                    tracing::info!(
                        digest = %receipt.digest,
                        context = %tx.context,
                        progress = format!("{}/{}", index + 1, total),
                        "Transaction executed"
                    );
                    receipts.push(receipt);
                }
                Err(source) => {
                    tracing::error!(
                        context = %tx.context,
                        completed = receipts.len(),
                        error = %source,
                        "Submission failed, stopping"
                    );
                    return Err(Error::SubmissionFailed {
                        context: tx.context,
                        completed: receipts.len(),
                        source,
                    });
                }
            }
        }

        Ok(receipts)
    }

    async fn submit(&self, payload: &Payload) -> std::result::Result<TransactionReceipt, RpcError> {
        let gas_budget = payload.gas_budget().unwrap_or(self.default_gas_budget);
        tracing::debug!(payload = %payload, gas_budget, "Building transaction");

        let tx_bytes = self
            .client
            .build_transaction(self.signer.address(), payload, gas_budget)
            .await?;
        let signature = self.signer.sign_transaction(&tx_bytes);

        self.client.execute_transaction(&tx_bytes, &signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sui::mock::MockChain;
    use crate::sui::operations::{set_commission_rate, withdraw_stake};
    use crate::sui::types::ObjectId;
    use crate::wallet::{transaction_digest, KeyMaterial};
    use ed25519_dalek::{Signature, Verifier};

    const DELAY: Duration = Duration::from_millis(3000);
    const GAS: u64 = 50_000_000;

    fn signer() -> SuiSigner {
        let key = KeyMaterial::try_from_slice(&[3u8; 32]).unwrap();
        SuiSigner::new(&key, "http://localhost:9000").unwrap()
    }

    fn withdrawals(n: u8) -> Vec<PendingTransaction> {
        (1..=n)
            .map(|i| {
                let stake = MockChain::stake(i);
                PendingTransaction::new(
                    format!("withdraw stake {}", stake.staked_sui_id),
                    withdraw_stake(&stake),
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_submits_in_order_with_delay_between() {
        let chain = MockChain::new();
        let signer = signer();
        let submitter = Submitter::new(&chain, &signer, DELAY, GAS);

        let start = tokio::time::Instant::now();
        let receipts = submitter.submit_all(withdrawals(3)).await.unwrap();

        assert_eq!(receipts.len(), 3);
        let executed = chain.executed();
        assert_eq!(executed.len(), 3);
        for (i, call) in executed.iter().enumerate() {
            assert_eq!(receipts[i].digest, call.digest);
            assert_eq!(call.stake_id, Some(ObjectId::from_short(i as u8 + 1)));
        }

        // Delay between submissions, none after the last
        assert_eq!(executed[0].at - start, Duration::ZERO);
        assert_eq!(executed[1].at - executed[0].at, DELAY);
        assert_eq!(executed[2].at - executed[1].at, DELAY);
        assert_eq!(start.elapsed(), DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_pipeline() {
        let chain = MockChain::new().failing_execution_at(2);
        let signer = signer();
        let submitter = Submitter::new(&chain, &signer, DELAY, GAS);

        let err = submitter.submit_all(withdrawals(4)).await.unwrap_err();

        match err {
            Error::SubmissionFailed {
                context,
                completed,
                source,
            } => {
                assert_eq!(completed, 1);
                assert!(context.contains(ObjectId::from_short(2).as_str()));
                assert!(matches!(source, RpcError::Rejected { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Stake 1 landed, stake 2 was attempted, stakes 3 and 4 never were
        assert_eq!(chain.executed().len(), 1);
        assert_eq!(chain.execution_attempts(), 2);
        assert_eq!(chain.built().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch_is_noop() {
        let chain = MockChain::new();
        let signer = signer();
        let submitter = Submitter::new(&chain, &signer, DELAY, GAS);

        let start = tokio::time::Instant::now();
        let receipts = submitter.submit_all(Vec::new()).await.unwrap();
        assert!(receipts.is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(chain.execution_attempts(), 0);
    }

    #[tokio::test]
    async fn test_submit_one_uses_explicit_gas_budget() {
        let chain = MockChain::new();
        let signer = signer();
        let submitter = Submitter::new(&chain, &signer, DELAY, GAS);

        submitter
            .submit_one(PendingTransaction::new(
                "update commission rate",
                set_commission_rate(200),
            ))
            .await
            .unwrap();

        let built = chain.built();
        assert_eq!(built.len(), 1);
        assert_eq!(
            built[0].gas_budget,
            crate::sui::operations::COMMISSION_RATE_GAS_BUDGET
        );
        assert_eq!(&built[0].sender, signer.address());
    }

    #[tokio::test]
    async fn test_default_gas_budget_applies() {
        let chain = MockChain::new();
        let signer = signer();
        let submitter = Submitter::new(&chain, &signer, Duration::ZERO, GAS);

        submitter
            .submit_one(PendingTransaction::new(
                "withdraw",
                withdraw_stake(&MockChain::stake(9)),
            ))
            .await
            .unwrap();
        assert_eq!(chain.built()[0].gas_budget, GAS);
    }

    #[tokio::test]
    async fn test_submit_one_failure_carries_context() {
        let chain = MockChain::new().failing_execution_at(1);
        let signer = signer();
        let submitter = Submitter::new(&chain, &signer, DELAY, GAS);

        let err = submitter
            .submit_one(PendingTransaction::new(
                "update reference gas price",
                withdraw_stake(&MockChain::stake(1)),
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("update reference gas price"));
    }

    #[tokio::test]
    async fn test_signature_covers_built_bytes() {
        let chain = MockChain::new();
        let signer = signer();
        let submitter = Submitter::new(&chain, &signer, DELAY, GAS);

        submitter
            .submit_one(PendingTransaction::new(
                "withdraw",
                withdraw_stake(&MockChain::stake(1)),
            ))
            .await
            .unwrap();

        let executed = chain.executed();
        let serialized = {
            use base64::Engine as _;
            base64::engine::general_purpose::STANDARD
                .decode(&executed[0].signature)
                .unwrap()
        };
        let signature = Signature::from_slice(&serialized[1..65]).unwrap();
        signer
            .public_key()
            .verify(&transaction_digest(&executed[0].tx_bytes), &signature)
            .unwrap();
    }
}
