//! Backing-store contract and the in-process implementation.
//!
//! The durable store is an external collaborator; `RecordStore` is its
//! consumed surface: filter-by-organization, filter-by-name-prefix, the
//! atomic two-kind prefix rename, and the count/existence lookups the access
//! guard needs. `MemStore` implements the contract over tokio-synchronized
//! maps and backs the server binary and the test suite.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{DeckError, Result};
use crate::paths::rewrite_prefix;
use crate::types::{Event, Organization, Process, Shared, StorageEntry, Trigger};

#[async_trait]
pub trait RecordStore: Send + Sync {
    // Records
    async fn triggers_by_prefix(&self, organization_id: &str, prefix: &str)
        -> Result<Vec<Trigger>>;
    async fn shareds_by_prefix(&self, organization_id: &str, prefix: &str) -> Result<Vec<Shared>>;
    async fn trigger_by_id(&self, organization_id: &str, id: &str) -> Result<Option<Trigger>>;
    async fn create_trigger(&self, trigger: Trigger) -> Result<Trigger>;
    async fn create_shared(&self, shared: Shared) -> Result<Shared>;
    async fn delete_by_prefix(&self, organization_id: &str, prefix: &str) -> Result<u64>;
    /// The "regex replace on name, filtered by prefix, across two tables,
    /// atomically" primitive: first-occurrence substitution, both kinds, one
    /// transaction.
    async fn rename_prefix(&self, organization_id: &str, prefix: &str, target: &str)
        -> Result<u64>;
    async fn set_enable_by_prefix(
        &self,
        organization_id: &str,
        prefix: &str,
        enable: bool,
    ) -> Result<u64>;

    // Events & processes
    async fn insert_event(&self, event: Event) -> Result<()>;
    async fn events_recent(&self, organization_id: &str, limit: usize) -> Result<Vec<Event>>;
    async fn event_by_id(&self, organization_id: &str, event_id: &str) -> Result<Option<Event>>;
    async fn insert_process(&self, process: Process) -> Result<()>;
    async fn processes_for_event(
        &self,
        organization_id: &str,
        event_id: &str,
    ) -> Result<Vec<Process>>;

    // Storage
    async fn upsert_storage(&self, entry: StorageEntry) -> Result<StorageEntry>;
    async fn storage_by_key(
        &self,
        organization_id: &str,
        key: &str,
    ) -> Result<Option<StorageEntry>>;
    async fn storage_list(&self, organization_id: &str) -> Result<Vec<StorageEntry>>;
    async fn delete_storage(&self, organization_id: &str, key: &str) -> Result<bool>;

    // Organizations
    async fn organization(&self, organization_id: &str) -> Result<Option<Organization>>;
    async fn insert_organization(&self, organization: Organization) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    triggers: Vec<Trigger>,
    shareds: Vec<Shared>,
    events: Vec<Event>,
    processes: Vec<Process>,
    storages: Vec<StorageEntry>,
    organizations: HashMap<String, Organization>,
}

/// In-process store. Every mutation happens under one write lock, which is
/// what gives `rename_prefix` and `delete_by_prefix` their all-or-nothing
/// behavior across both record kinds.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemStore {
    async fn triggers_by_prefix(
        &self,
        organization_id: &str,
        prefix: &str,
    ) -> Result<Vec<Trigger>> {
        let inner = self.inner.read().await;
        Ok(inner
            .triggers
            .iter()
            .filter(|t| t.organization_id == organization_id && t.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn shareds_by_prefix(&self, organization_id: &str, prefix: &str) -> Result<Vec<Shared>> {
        let inner = self.inner.read().await;
        Ok(inner
            .shareds
            .iter()
            .filter(|s| s.organization_id == organization_id && s.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn trigger_by_id(&self, organization_id: &str, id: &str) -> Result<Option<Trigger>> {
        let inner = self.inner.read().await;
        Ok(inner
            .triggers
            .iter()
            .find(|t| t.organization_id == organization_id && t.id == id)
            .cloned())
    }

    async fn create_trigger(&self, trigger: Trigger) -> Result<Trigger> {
        let mut inner = self.inner.write().await;
        if inner
            .triggers
            .iter()
            .any(|t| t.organization_id == trigger.organization_id && t.name == trigger.name)
        {
            return Err(DeckError::NameTaken(trigger.name));
        }
        inner.triggers.push(trigger.clone());
        Ok(trigger)
    }

    async fn create_shared(&self, shared: Shared) -> Result<Shared> {
        let mut inner = self.inner.write().await;
        if inner
            .shareds
            .iter()
            .any(|s| s.organization_id == shared.organization_id && s.name == shared.name)
        {
            return Err(DeckError::NameTaken(shared.name));
        }
        inner.shareds.push(shared.clone());
        Ok(shared)
    }

    async fn delete_by_prefix(&self, organization_id: &str, prefix: &str) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.triggers.len() + inner.shareds.len();
        inner
            .triggers
            .retain(|t| !(t.organization_id == organization_id && t.name.starts_with(prefix)));
        inner
            .shareds
            .retain(|s| !(s.organization_id == organization_id && s.name.starts_with(prefix)));
        Ok((before - inner.triggers.len() - inner.shareds.len()) as u64)
    }

    async fn rename_prefix(
        &self,
        organization_id: &str,
        prefix: &str,
        target: &str,
    ) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut changed = 0u64;
        for trigger in inner.triggers.iter_mut() {
            if trigger.organization_id == organization_id && trigger.name.starts_with(prefix) {
                trigger.name = rewrite_prefix(&trigger.name, prefix, target);
                changed += 1;
            }
        }
        for shared in inner.shareds.iter_mut() {
            if shared.organization_id == organization_id && shared.name.starts_with(prefix) {
                shared.name = rewrite_prefix(&shared.name, prefix, target);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn set_enable_by_prefix(
        &self,
        organization_id: &str,
        prefix: &str,
        enable: bool,
    ) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut changed = 0u64;
        for trigger in inner.triggers.iter_mut() {
            if trigger.organization_id == organization_id && trigger.name.starts_with(prefix) {
                trigger.enable = enable;
                changed += 1;
            }
        }
        for shared in inner.shareds.iter_mut() {
            if shared.organization_id == organization_id && shared.name.starts_with(prefix) {
                shared.enable = enable;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_event(&self, event: Event) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.events.push(event);
        Ok(())
    }

    async fn events_recent(&self, organization_id: &str, limit: usize) -> Result<Vec<Event>> {
        let inner = self.inner.read().await;
        let mut events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| e.organization_id == organization_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.emitted_at.cmp(&a.emitted_at));
        events.truncate(limit);
        Ok(events)
    }

    async fn event_by_id(&self, organization_id: &str, event_id: &str) -> Result<Option<Event>> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .find(|e| e.organization_id == organization_id && e.id == event_id)
            .cloned())
    }

    async fn insert_process(&self, process: Process) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.processes.push(process);
        Ok(())
    }

    async fn processes_for_event(
        &self,
        organization_id: &str,
        event_id: &str,
    ) -> Result<Vec<Process>> {
        let inner = self.inner.read().await;
        Ok(inner
            .processes
            .iter()
            .filter(|p| p.organization_id == organization_id && p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn upsert_storage(&self, entry: StorageEntry) -> Result<StorageEntry> {
        let mut inner = self.inner.write().await;
        match inner
            .storages
            .iter_mut()
            .find(|s| s.organization_id == entry.organization_id && s.key == entry.key)
        {
            Some(existing) => {
                existing.value = entry.value.clone();
                Ok(existing.clone())
            }
            None => {
                inner.storages.push(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn storage_by_key(
        &self,
        organization_id: &str,
        key: &str,
    ) -> Result<Option<StorageEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .storages
            .iter()
            .find(|s| s.organization_id == organization_id && s.key == key)
            .cloned())
    }

    async fn storage_list(&self, organization_id: &str) -> Result<Vec<StorageEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .storages
            .iter()
            .filter(|s| s.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn delete_storage(&self, organization_id: &str, key: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.storages.len();
        inner
            .storages
            .retain(|s| !(s.organization_id == organization_id && s.key == key));
        Ok(inner.storages.len() < before)
    }

    async fn organization(&self, organization_id: &str) -> Result<Option<Organization>> {
        let inner = self.inner.read().await;
        Ok(inner.organizations.get(organization_id).cloned())
    }

    async fn insert_organization(&self, organization: Organization) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.organizations.insert(organization.id.clone(), organization);
        Ok(())
    }
}
