//! Key decoding and transaction signing
//!
//! Private key bytes exist only inside this module. Callers get a
//! [`SuiSigner`] that exposes signing operations and the public address.

mod decoder;
mod signer;

pub use decoder::{decode_keypair, KeyEncoding, KeyMaterial, ED25519_FLAG, PRIVATE_KEY_SIZE};
pub use signer::{address_from_public_key, transaction_digest, SuiSigner, TRANSACTION_INTENT};

#[cfg(test)]
pub(crate) use decoder::encode_keypair;
