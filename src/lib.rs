//! Sui validator operator toolkit
//!
//! Signs and submits a small fixed set of validator transactions:
//! - withdraw all stakes held with a validator
//! - send SUI
//! - update the reference gas price
//! - update the commission rate
//!
//! # Security Model
//!
//! - Keys come from HashiCorp Vault or are entered without echo
//! - Private key bytes never leave the wallet module and are zeroized on drop
//! - Transactions are built by the fullnode but signed locally
//! - Secret values never appear in logs or error messages

pub mod config;
pub mod prompt;
pub mod runner;
pub mod secrets;
pub mod sui;
pub mod wallet;

mod error;

pub use config::{Config, KeySource, ProviderKind, SuiConfig, VaultConfig};
pub use error::{Error, Result};
pub use runner::{OperationRequest, OperationResult, OperationRunner};
pub use secrets::{resolve_key, SecretReference, SecretStore, VaultClient};
pub use wallet::{KeyEncoding, SuiSigner};
