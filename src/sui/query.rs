//! Read-only chain lookups
//!
//! Cursor-paginated queries are followed to exhaustion before results are
//! returned, so callers always filter the complete set.

use crate::sui::client::{ChainClient, RpcError};
use crate::sui::types::{Coin, OwnedObject, Page, Stake, SuiAddress, SUI_COIN_TYPE};
use std::future::Future;

/// Collect every item of a cursor-paginated query
///
/// Stops when the node hands back the cursor it was just given.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, RpcError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, RpcError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.clone()).await?;
        items.extend(page.data);

        match page.next_cursor {
            Some(next) if page.has_next_page => {
                if cursor.as_deref() == Some(next.as_str()) {
                    tracing::warn!(cursor = %next, "Node repeated the page cursor, stopping");
                    break;
                }
                cursor = Some(next);
            }
            _ => break,
        }
    }

    Ok(items)
}

/// Stakes owned by `owner` and delegated to `validator`, in node order
pub async fn get_self_stakes(
    client: &dyn ChainClient,
    owner: &SuiAddress,
    validator: &SuiAddress,
) -> Result<Vec<Stake>, RpcError> {
    let delegations = client.get_stakes(owner).await?;

    let stakes = delegations
        .into_iter()
        .find(|d| &d.validator_address == validator)
        .map(|d| d.stakes)
        .unwrap_or_default();

    tracing::debug!(
        owner = %owner,
        validator = %validator,
        count = stakes.len(),
        "Fetched stakes"
    );

    Ok(stakes)
}

/// All SUI coins owned by `owner`
pub async fn get_owned_sui_coins(
    client: &dyn ChainClient,
    owner: &SuiAddress,
) -> Result<Vec<Coin>, RpcError> {
    collect_pages(|cursor| async move {
        client
            .get_coins(owner, SUI_COIN_TYPE, cursor.as_deref())
            .await
    })
    .await
}

/// All objects of `struct_type` owned by `owner`
pub async fn get_owned_objects_of_type(
    client: &dyn ChainClient,
    owner: &SuiAddress,
    struct_type: &str,
) -> Result<Vec<OwnedObject>, RpcError> {
    collect_pages(|cursor| async move {
        client
            .get_owned_objects(owner, struct_type, cursor.as_deref())
            .await
    })
    .await
}
