//! Per-organization key/value storage with publish-after-commit
//! notifications. Subscribers get only the changed key and re-read.

use crate::broker::{org_storage_channel, Broker};
use crate::error::{DeckError, Result};
use crate::store::RecordStore;
use crate::types::StorageEntry;

/// Keys claimed by the UI for in-progress rows.
const RESERVED_KEYS: &[&str] = &["new", "tmp:new"];

const MIN_KEY_LEN: usize = 3;

fn validate_key(key: &str) -> Result<()> {
    if RESERVED_KEYS.contains(&key) {
        return Err(DeckError::ReservedKey(key.to_string()));
    }
    if key.len() < MIN_KEY_LEN {
        return Err(DeckError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub async fn upsert(
    store: &dyn RecordStore,
    broker: &dyn Broker,
    organization_id: &str,
    key: &str,
    value: serde_json::Value,
) -> Result<StorageEntry> {
    validate_key(key)?;
    let entry = store
        .upsert_storage(StorageEntry {
            organization_id: organization_id.to_string(),
            key: key.to_string(),
            value,
        })
        .await?;
    broker
        .publish(&org_storage_channel(organization_id), key)
        .await;
    Ok(entry)
}

pub async fn get(
    store: &dyn RecordStore,
    organization_id: &str,
    key: &str,
) -> Result<StorageEntry> {
    store
        .storage_by_key(organization_id, key)
        .await?
        .ok_or_else(|| DeckError::StorageKeyNotFound(key.to_string()))
}

pub async fn list(store: &dyn RecordStore, organization_id: &str) -> Result<Vec<StorageEntry>> {
    store.storage_list(organization_id).await
}

/// Delete a key. The deletion is published on the same channel as writes; a
/// subscriber re-reading the key will find it gone and skip the emit.
pub async fn delete(
    store: &dyn RecordStore,
    broker: &dyn Broker,
    organization_id: &str,
    key: &str,
) -> Result<()> {
    if !store.delete_storage(organization_id, key).await? {
        return Err(DeckError::StorageKeyNotFound(key.to_string()));
    }
    broker
        .publish(&org_storage_channel(organization_id), key)
        .await;
    Ok(())
}
