//! Sui JSON-RPC data types used by the toolkit

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Package holding the Sui system module
pub const SUI_SYSTEM_PACKAGE: u8 = 0x3;

/// Shared Sui system state object
pub const SUI_SYSTEM_STATE_OBJECT: u8 = 0x5;

/// Coin type of the native SUI coin
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Number of MIST in one SUI
pub const MIST_PER_SUI: u64 = 1_000_000_000;

fn normalize_hex_id(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "'{}' is not a valid Sui address or object id",
            value
        ));
    }

    Ok(format!("0x{:0>64}", digits.to_ascii_lowercase()))
}

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(format!("0x{}", hex::encode(bytes)))
            }

            /// Id whose 32 bytes are all zero except the last one, e.g. `0x5`
            pub fn from_short(value: u8) -> Self {
                let mut bytes = [0u8; 32];
                bytes[31] = value;
                Self::from_bytes(bytes)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                normalize_hex_id(s).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

hex_id!(
    /// 32-byte Sui account address, normalized to `0x` + 64 lowercase hex digits
    SuiAddress
);

hex_id!(
    /// 32-byte Sui object id, normalized like [`SuiAddress`]
    ObjectId
);

/// Stakes delegated by one owner to one validator (`suix_getStakes`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedStake {
    pub validator_address: SuiAddress,
    pub staking_pool: ObjectId,
    pub stakes: Vec<Stake>,
}

/// A single stake position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stake {
    pub staked_sui_id: ObjectId,
    #[serde(default)]
    pub stake_request_epoch: Option<String>,
    #[serde(default)]
    pub stake_active_epoch: Option<String>,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub estimated_reward: Option<String>,
}

/// One page of a cursor-paginated query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// A coin object owned by an address (`suix_getCoins`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub coin_type: String,
    pub coin_object_id: ObjectId,
    pub version: String,
    pub digest: String,
    pub balance: String,
}

impl Coin {
    pub fn balance_mist(&self) -> Option<u64> {
        self.balance.parse().ok()
    }
}

/// Entry of `suix_getOwnedObjects`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedObject {
    #[serde(default)]
    pub data: Option<ObjectData>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: ObjectId,
    pub version: String,
    pub digest: String,
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub content: Option<ObjectContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub data_type: String,
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub has_public_transfer: bool,
    #[serde(default)]
    pub fields: Value,
}

/// Move fields of `0x3::validator_cap::UnverifiedValidatorOperationCap`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorOperationCapFields {
    pub authorizer_validator_address: SuiAddress,
    pub id: UidField,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UidField {
    pub id: ObjectId,
}

impl OwnedObject {
    /// Decode the content as a validator operation cap, if it is one
    pub fn as_operation_cap(&self) -> Option<ValidatorOperationCapFields> {
        let content = self.data.as_ref()?.content.as_ref()?;
        if content.data_type != "moveObject" {
            return None;
        }
        serde_json::from_value(content.fields.clone()).ok()
    }
}

/// Result of executing a signed transaction
#[derive(Debug, Clone, Serialize)]
pub struct TransactionReceipt {
    pub digest: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Full node response, as returned by `sui_executeTransactionBlock`
    pub response: Value,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
