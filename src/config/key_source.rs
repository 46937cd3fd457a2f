//! Key source selection
//!
//! Where the signing key comes from can be given in a JSON file, on the
//! command line, or interactively. All three fill the same [`KeySource`],
//! which is validated into a [`SecretReference`] once complete.
//!
//! ```json
//! { "provider": "vault", "path": "secret/data/validator", "key": "account_key", "encoding": "plain" }
//! ```

use crate::secrets::{SecretReference, DEFAULT_KEY_NAME};
use crate::wallet::KeyEncoding;
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

/// Key provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// HashiCorp Vault KV record
    Vault,
    /// Base64 keypair entered by the operator
    #[serde(alias = "plain-text")]
    Local,
}

/// Partially known key source
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeySource {
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<SecretString>,
    #[serde(default)]
    pub encoding: Option<KeyEncoding>,
}

impl KeySource {
    /// Read a key source file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read key source file {}: {}", path.display(), e))
        })?;
        let source: KeySource = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("invalid key source file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            file = %path.display(),
            provider = ?source.provider,
            "Loaded key source file"
        );
        Ok(source)
    }

    /// Fill fields missing from `self` with those of `fallback`
    pub fn or(self, fallback: KeySource) -> KeySource {
        KeySource {
            provider: self.provider.or(fallback.provider),
            path: self.path.or(fallback.path),
            key: self.key.or(fallback.key),
            value: self.value.or(fallback.value),
            encoding: self.encoding.or(fallback.encoding),
        }
    }

    /// Whether anything still has to be asked for
    pub fn needs_input(&self) -> bool {
        match self.provider {
            None => true,
            Some(ProviderKind::Vault) => non_empty(self.path.as_deref()).is_none(),
            Some(ProviderKind::Local) => self
                .value
                .as_ref()
                .map_or(true, |v| v.expose_secret().trim().is_empty()),
        }
    }

    /// Validate into a reference, using `default_encoding` if none was given
    pub fn into_reference(self, default_encoding: KeyEncoding) -> Result<SecretReference> {
        let encoding = self.encoding.unwrap_or(default_encoding);

        match self.provider {
            None => Err(Error::Config("no key provider selected".to_string())),
            Some(ProviderKind::Vault) => {
                let path = non_empty(self.path.as_deref())
                    .ok_or_else(|| Error::Config("Vault path must not be empty".to_string()))?;
                let key_name = non_empty(self.key.as_deref()).unwrap_or(DEFAULT_KEY_NAME);

                Ok(SecretReference::Remote {
                    path: path.to_string(),
                    key_name: key_name.to_string(),
                    encoding,
                })
            }
            Some(ProviderKind::Local) => {
                let value = self
                    .value
                    .filter(|v| !v.expose_secret().trim().is_empty())
                    .ok_or_else(|| Error::Config("no keypair value given".to_string()))?;

                Ok(SecretReference::Local {
                    encoded_value: value,
                    encoding,
                })
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
