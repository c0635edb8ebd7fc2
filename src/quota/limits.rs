//! Global daily limit lookup.

use crate::error::{GateError, Result};
use crate::store::{DocumentStore, CONFIG_COLLECTION};

use super::CONFIG_DOC;

/// Read the per-user daily request limit from the config collection.
///
/// Fails with [`GateError::Configuration`] when the config document is absent
/// or `userMaxRequests` is not a positive integer. Read-only; never writes.
pub async fn daily_limit(store: &dyn DocumentStore) -> Result<u32> {
    let doc = store
        .get(CONFIG_COLLECTION, CONFIG_DOC)
        .await
        .map_err(|e| GateError::Configuration(e.to_string()))?
        .ok_or_else(|| GateError::Configuration("Configuration not found".into()))?;

    doc["userMaxRequests"]
        .as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| GateError::Configuration("Invalid userMaxRequests configuration".into()))
}
