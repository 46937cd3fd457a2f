//! Sui signer
//!
//! SECURITY: This is the ONLY place where the signing key lives after decoding.
//! - The key is held in ed25519-dalek's SigningKey, which zeroizes on drop
//! - Keys are never serialized
//! - Keys are never logged

use crate::sui::SuiAddress;
use crate::wallet::decoder::{KeyMaterial, ED25519_FLAG};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use url::Url;

type Blake2b256 = Blake2b<U32>;

/// Intent prefix for transaction data: scope, version, app id
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Digest that is actually signed for a BCS-encoded `TransactionData`
pub fn transaction_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(TRANSACTION_INTENT);
    hasher.update(tx_bytes);
    finalize(hasher)
}

/// Sui address of an Ed25519 public key: `blake2b256(flag || pubkey)`
pub fn address_from_public_key(public_key: &VerifyingKey) -> SuiAddress {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key.as_bytes());
    SuiAddress::from_bytes(finalize(hasher))
}

fn finalize(hasher: Blake2b256) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Signing identity bound to one fullnode endpoint
pub struct SuiSigner {
    signing_key: SigningKey,
    address: SuiAddress,
    endpoint: Url,
}

impl SuiSigner {
    pub fn new(key: &KeyMaterial, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("Invalid Sui RPC URL '{}': {}", endpoint, e)))?;

        let signing_key = SigningKey::from_bytes(key.expose());
        let address = address_from_public_key(&signing_key.verifying_key());

        Ok(Self {
            signing_key,
            address,
            endpoint,
        })
    }

    pub fn address(&self) -> &SuiAddress {
        &self.address
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sign transaction bytes, returning the serialized Sui signature
    /// `base64(flag || signature || pubkey)`.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let digest = transaction_digest(tx_bytes);
        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        STANDARD.encode(serialized)
    }
}

// Implement Debug manually to avoid exposing the key
impl std::fmt::Debug for SuiSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiSigner")
            .field("address", &self.address)
            .field("endpoint", &self.endpoint.as_str())
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}
