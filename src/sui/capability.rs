//! Validator operation capability lookup
//!
//! Privileged validator calls need the `UnverifiedValidatorOperationCap`
//! object. The cap can be held by the validator itself or delegated to an
//! operator account, so the holder and the validator it authorizes may differ.

use crate::sui::client::ChainClient;
use crate::sui::query::get_owned_objects_of_type;
use crate::sui::types::{ObjectId, OwnedObject, SuiAddress};
use crate::{Error, Result};

pub const VALIDATOR_OPERATION_CAP_TYPE: &str =
    "0x3::validator_cap::UnverifiedValidatorOperationCap";

/// Validator whose cap is needed: the explicit one, else the caller itself
pub fn capability_target<'a>(
    caller: &'a SuiAddress,
    validator: Option<&'a SuiAddress>,
) -> &'a SuiAddress {
    validator.unwrap_or(caller)
}

/// First cap among `objects` authorizing `target`
pub fn find_operator_capability(objects: &[OwnedObject], target: &SuiAddress) -> Option<ObjectId> {
    objects
        .iter()
        .filter_map(OwnedObject::as_operation_cap)
        .find(|cap| &cap.authorizer_validator_address == target)
        .map(|cap| cap.id.id)
}

/// Resolve the operation cap held by `address` for `validator` (or for itself)
pub async fn resolve_operator_capability(
    client: &dyn ChainClient,
    address: &SuiAddress,
    validator: Option<&SuiAddress>,
) -> Result<ObjectId> {
    let target = capability_target(address, validator);
    let objects =
        get_owned_objects_of_type(client, address, VALIDATOR_OPERATION_CAP_TYPE).await?;

    match find_operator_capability(&objects, target) {
        Some(cap) => {
            tracing::info!(
                holder = %address,
                validator = %target,
                cap = %cap,
                "Resolved validator operation capability"
            );
            Ok(cap)
        }
        None => Err(Error::NoOperatorCapability {
            address: address.clone(),
            validator: target.clone(),
        }),
    }
}
