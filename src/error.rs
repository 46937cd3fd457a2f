//! Error types for the Sui toolkit

use crate::secrets::VaultError;
use crate::sui::{RpcError, SuiAddress};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid keypair: {0}")]
    InvalidKeyFormat(String),

    #[error("Failed to login to Vault: {0}")]
    SecretStoreAuth(#[source] VaultError),

    #[error("Failed to read keypair from Vault at '{path}': {source}")]
    SecretStoreRead {
        path: String,
        #[source]
        source: VaultError,
    },

    #[error("Address {address} holds no operation capability for validator {validator}")]
    NoOperatorCapability {
        address: SuiAddress,
        validator: SuiAddress,
    },

    #[error("Failed to {context} ({completed} transaction(s) already submitted): {source}")]
    SubmissionFailed {
        context: String,
        completed: usize,
        #[source]
        source: RpcError,
    },

    #[error("Sui RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
