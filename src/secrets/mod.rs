//! Signing key acquisition
//!
//! A key comes either from a locally supplied encoded value or from a field
//! of a Vault KV record. Remote lookups run inside a login/logout session
//! that is always closed, whatever the outcome.

mod vault;

pub use vault::{SecretStore, VaultClient, VaultError};

use crate::wallet::{decode_keypair, KeyEncoding, KeyMaterial};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

/// Default field name of the key inside a Vault record
pub const DEFAULT_KEY_NAME: &str = "account_key";

/// Where the signing key comes from
#[derive(Debug)]
pub enum SecretReference {
    Remote {
        path: String,
        key_name: String,
        encoding: KeyEncoding,
    },
    Local {
        encoded_value: SecretString,
        encoding: KeyEncoding,
    },
}

impl SecretReference {
    pub fn encoding(&self) -> KeyEncoding {
        match self {
            SecretReference::Remote { encoding, .. } | SecretReference::Local { encoding, .. } => {
                *encoding
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SecretReference::Remote { .. })
    }
}

/// Resolve a reference into key material.
///
/// `store` is only consulted for remote references; passing `None` there is
/// a configuration error.
pub async fn resolve_key(
    reference: &SecretReference,
    store: Option<&dyn SecretStore>,
) -> Result<KeyMaterial> {
    match reference {
        SecretReference::Local {
            encoded_value,
            encoding,
        } => {
            tracing::debug!(encoding = ?encoding, "Decoding local key");
            decode_keypair(encoded_value.expose_secret(), *encoding)
        }
        SecretReference::Remote {
            path,
            key_name,
            encoding,
        } => {
            let store = store.ok_or_else(|| {
                Error::Config("a secret store is required for remote keys".to_string())
            })?;

            let fetched = fetch_remote(store, path, key_name).await;
            store.logout().await;

            let value = fetched?;
            tracing::info!(path = %path, key = %key_name, "Fetched key from Vault");
            decode_keypair(value.expose_secret(), *encoding)
        }
    }
}

async fn fetch_remote(store: &dyn SecretStore, path: &str, key_name: &str) -> Result<SecretString> {
    store.login().await.map_err(Error::SecretStoreAuth)?;

    let read_error = |source| Error::SecretStoreRead {
        path: path.to_string(),
        source,
    };
    let mut record = store.read(path).await.map_err(read_error)?;
    extract_field(&mut record, key_name).map_err(read_error)
}

fn extract_field(record: &mut Map<String, Value>, field: &str) -> std::result::Result<SecretString, VaultError> {
    match record.remove(field) {
        Some(Value::String(value)) => Ok(SecretString::from(value)),
        Some(_) => Err(VaultError::NotAString {
            field: field.to_string(),
        }),
        None => Err(VaultError::MissingField {
            field: field.to_string(),
        }),
    }
}
