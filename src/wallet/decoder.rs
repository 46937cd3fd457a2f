//! Sui keystore value decoding
//!
//! A Sui keystore entry is `base64(flag || private_key)`, where `flag` is the
//! signature scheme byte. Only Ed25519 (flag `0x00`) is accepted.
//!
//! SECURITY: intermediate buffers are zeroized on drop and decoding errors
//! never echo the input.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::zeroize::Zeroizing;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};

/// Size of a raw Ed25519 private key
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Scheme flag for Ed25519 keys
pub const ED25519_FLAG: u8 = 0x00;

/// How the key value handed to the toolkit is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEncoding {
    /// `base64(flag || key)`, as written by `sui keytool`
    #[default]
    #[serde(alias = "base64")]
    Plain,
    /// `base64(base64(flag || key))`, for stores that mangle raw base64
    #[serde(alias = "doubleBase64")]
    DoubleEncoded,
}

/// Raw Ed25519 private key bytes
pub struct KeyMaterial(SecretBox<[u8; PRIVATE_KEY_SIZE]>);

impl KeyMaterial {
    /// Copy key bytes out of a slice, rejecting anything but `PRIVATE_KEY_SIZE` bytes
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; PRIVATE_KEY_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidKeyFormat(format!(
                "expected {} private key bytes, got {}",
                PRIVATE_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(SecretBox::new(Box::new(array))))
    }

    pub fn expose(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Decode a keystore value into raw private key bytes
pub fn decode_keypair(encoded: &str, encoding: KeyEncoding) -> Result<KeyMaterial> {
    let encoded = encoded.trim();

    let outer: Zeroizing<Vec<u8>>;
    let inner = match encoding {
        KeyEncoding::Plain => encoded,
        KeyEncoding::DoubleEncoded => {
            outer = Zeroizing::new(STANDARD.decode(encoded).map_err(|e| {
                Error::InvalidKeyFormat(format!("outer base64 layer is invalid: {}", e))
            })?);
            std::str::from_utf8(&outer)
                .map_err(|_| {
                    Error::InvalidKeyFormat("outer base64 layer is not valid UTF-8".to_string())
                })?
                .trim()
        }
    };

    let decoded = Zeroizing::new(
        STANDARD
            .decode(inner)
            .map_err(|e| Error::InvalidKeyFormat(format!("value is not valid base64: {}", e)))?,
    );

    if decoded.len() != PRIVATE_KEY_SIZE + 1 || decoded[0] != ED25519_FLAG {
        return Err(Error::InvalidKeyFormat(format!(
            "expected {} bytes starting with scheme flag {:#04x}",
            PRIVATE_KEY_SIZE + 1,
            ED25519_FLAG
        )));
    }

    KeyMaterial::try_from_slice(&decoded[1..])
}

#[cfg(test)]
pub(crate) fn encode_keypair(key: &[u8; PRIVATE_KEY_SIZE]) -> String {
    let mut raw = vec![ED25519_FLAG];
    raw.extend_from_slice(key);
    STANDARD.encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> [u8; PRIVATE_KEY_SIZE] {
        let mut key = [0u8; PRIVATE_KEY_SIZE];
        for (i, b) in key.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(7).wrapping_add(3);
        }
        key
    }

    #[test]
    fn test_decode_plain_strips_flag() {
        let key = sample_key();
        let decoded = decode_keypair(&encode_keypair(&key), KeyEncoding::Plain).unwrap();
        assert_eq!(decoded.expose(), &key);
    }

    #[test]
    fn test_decode_double_encoded_matches_plain() {
        let key = sample_key();
        let plain = encode_keypair(&key);
        let double = STANDARD.encode(plain.as_bytes());

        let from_plain = decode_keypair(&plain, KeyEncoding::Plain).unwrap();
        let from_double = decode_keypair(&double, KeyEncoding::DoubleEncoded).unwrap();
        assert_eq!(from_plain.expose(), from_double.expose());
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let key = sample_key();
        let encoded = format!("  {}\n", encode_keypair(&key));
        let decoded = decode_keypair(&encoded, KeyEncoding::Plain).unwrap();
        assert_eq!(decoded.expose(), &key);
    }

    #[test]
    fn test_rejects_wrong_flag() {
        let mut raw = vec![0x01];
        raw.extend_from_slice(&sample_key());
        let err = decode_keypair(&STANDARD.encode(raw), KeyEncoding::Plain).unwrap_err();
        assert!(matches!(err, Error::InvalidKeyFormat(_)));
    }

    #[test]
    fn test_rejects_wrong_length() {
        for len in [0usize, 1, PRIVATE_KEY_SIZE, PRIVATE_KEY_SIZE + 2, 64] {
            let raw = vec![0u8; len];
            let err = decode_keypair(&STANDARD.encode(raw), KeyEncoding::Plain).unwrap_err();
            assert!(
                matches!(err, Error::InvalidKeyFormat(_)),
                "length {} should be rejected",
                len
            );
        }
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let err = decode_keypair("not base64!!", KeyEncoding::Plain).unwrap_err();
        assert!(matches!(err, Error::InvalidKeyFormat(_)));

        let err = decode_keypair("%%%", KeyEncoding::DoubleEncoded).unwrap_err();
        assert!(matches!(err, Error::InvalidKeyFormat(_)));
    }

    #[test]
    fn test_plain_value_is_not_accepted_as_double_encoded() {
        let plain = encode_keypair(&sample_key());
        assert!(decode_keypair(&plain, KeyEncoding::DoubleEncoded).is_err());
    }

    #[test]
    fn test_error_does_not_echo_input() {
        let secret_looking = STANDARD.encode([9u8; 40]);
        let err = decode_keypair(&secret_looking, KeyEncoding::Plain).unwrap_err();
        assert!(!err.to_string().contains(&secret_looking));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = KeyMaterial::try_from_slice(&sample_key()).unwrap();
        assert_eq!(format!("{:?}", key), "KeyMaterial([REDACTED])");
    }

    #[test]
    fn test_encoding_accepts_legacy_names() {
        let plain: KeyEncoding = serde_json::from_str("\"base64\"").unwrap();
        let double: KeyEncoding = serde_json::from_str("\"doubleBase64\"").unwrap();
        assert_eq!(plain, KeyEncoding::Plain);
        assert_eq!(double, KeyEncoding::DoubleEncoded);
        let canonical: KeyEncoding = serde_json::from_str("\"doubleEncoded\"").unwrap();
        assert_eq!(canonical, KeyEncoding::DoubleEncoded);
    }
}
