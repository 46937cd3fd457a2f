//! Environment configuration
//!
//! Values are read from the process environment (a `.env` file is loaded by
//! the binary first). Empty variables count as unset.
//!
//! ```bash
//! export VAULT_ADDR="https://vault.example.com:8200"
//! export VAULT_TOKEN="s.xxxxx"
//! export VAULT_NAMESPACE="validators"        # optional
//! export SUI_RPC_URL="https://rpc.mainnet.sui.io"
//! export SUI_VALIDATOR_ADDRESS="0x..."        # optional, stake filter
//! export SUI_SUBMISSION_DELAY_MS=3000
//! export SUI_GAS_BUDGET=50000000
//! ```

pub mod key_source;

pub use key_source::{KeySource, ProviderKind};

use crate::secrets::VaultClient;
use crate::sui::{SuiAddress, DEFAULT_SUBMISSION_DELAY};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

/// Public mainnet fullnode
pub const DEFAULT_RPC_URL: &str = "https://rpc.mainnet.sui.io";

/// Gas budget for payloads that do not carry their own (0.05 SUI)
pub const DEFAULT_GAS_BUDGET: u64 = 50_000_000;

/// Environment variable names
mod env_vars {
    pub const VAULT_ADDR: &str = "VAULT_ADDR";
    pub const VAULT_TOKEN: &str = "VAULT_TOKEN";
    pub const VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";

    pub const SUI_RPC_URL: &str = "SUI_RPC_URL";
    pub const SUI_VALIDATOR_ADDRESS: &str = "SUI_VALIDATOR_ADDRESS";
    pub const SUI_SUBMISSION_DELAY_MS: &str = "SUI_SUBMISSION_DELAY_MS";
    pub const SUI_GAS_BUDGET: &str = "SUI_GAS_BUDGET";
}

/// Vault connection settings, only required for remote keys
#[derive(Debug, Default)]
pub struct VaultConfig {
    pub address: Option<String>,
    pub token: Option<SecretString>,
    pub namespace: Option<String>,
}

impl VaultConfig {
    /// Build a client, failing if the address or token is missing
    pub fn client(&self) -> Result<VaultClient> {
        let address = self.address.as_deref().ok_or_else(|| {
            Error::Config(format!("{} must be set to read keys from Vault", env_vars::VAULT_ADDR))
        })?;
        let token = self.token.as_ref().ok_or_else(|| {
            Error::Config(format!("{} must be set to read keys from Vault", env_vars::VAULT_TOKEN))
        })?;

        VaultClient::new(
            address,
            SecretString::from(token.expose_secret().to_string()),
            self.namespace.clone(),
        )
        .map_err(|e| Error::Config(e.to_string()))
    }
}

/// Sui network settings
#[derive(Debug, Clone)]
pub struct SuiConfig {
    pub rpc_url: Url,
    /// Validator whose stakes `withdraw` targets; defaults to the signer
    pub validator_address: Option<SuiAddress>,
    pub submission_delay: Duration,
    pub gas_budget: u64,
}

#[derive(Debug)]
pub struct Config {
    pub vault: VaultConfig,
    pub sui: SuiConfig,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let vault = VaultConfig {
            address: get(env_vars::VAULT_ADDR),
            token: get(env_vars::VAULT_TOKEN).map(SecretString::from),
            namespace: get(env_vars::VAULT_NAMESPACE),
        };

        let rpc_url = match get(env_vars::SUI_RPC_URL) {
            Some(url) => {
                tracing::debug!("Using SUI_RPC_URL");
                Url::parse(url.trim()).map_err(|e| {
                    Error::Config(format!("{} is not a valid URL: {}", env_vars::SUI_RPC_URL, e))
                })?
            }
            None => {
                tracing::debug!(url = DEFAULT_RPC_URL, "SUI_RPC_URL not set, using public fullnode");
                Url::parse(DEFAULT_RPC_URL)
                    .map_err(|e| Error::Config(format!("bad default RPC URL: {}", e)))?
            }
        };

        let validator_address = get(env_vars::SUI_VALIDATOR_ADDRESS)
            .map(|v| {
                v.parse::<SuiAddress>().map_err(|e| {
                    Error::Config(format!("{}: {}", env_vars::SUI_VALIDATOR_ADDRESS, e))
                })
            })
            .transpose()?;

        let submission_delay = match get(env_vars::SUI_SUBMISSION_DELAY_MS) {
            Some(ms) => Duration::from_millis(parse_u64(env_vars::SUI_SUBMISSION_DELAY_MS, &ms)?),
            None => DEFAULT_SUBMISSION_DELAY,
        };

        let gas_budget = match get(env_vars::SUI_GAS_BUDGET) {
            Some(budget) => parse_u64(env_vars::SUI_GAS_BUDGET, &budget)?,
            None => DEFAULT_GAS_BUDGET,
        };
        if gas_budget == 0 {
            return Err(Error::Config(format!(
                "{} must be greater than zero",
                env_vars::SUI_GAS_BUDGET
            )));
        }

        Ok(Self {
            vault,
            sui: SuiConfig {
                rpc_url,
                validator_address,
                submission_delay,
                gas_budget,
            },
        })
    }
}

fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", name, value)))
}
