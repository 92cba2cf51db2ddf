//! Namespace mutator: path-scoped bulk operations over the flat record
//! store. Every operation takes a prefix (`/a/b/` for a folder, `/a/b` for a
//! single leaf) and is write-gated by the caller before it reaches here.
//!
//! Concurrent prefix mutations are delegated to the store's transactional
//! guarantees: move goes through the single `rename_prefix` primitive, but
//! two overlapping bulk operations racing each other can still interleave.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeckError, Result};
use crate::paths::{rewrite_prefix, rewrite_under_slug, validate_folder, validate_name};
use crate::store::RecordStore;
use crate::types::{Condition, ConditionType, Shared, Trigger};

/// A prefix argument is either a folder (trailing separator) or one exact
/// record name.
fn validate_prefix(path: &str) -> Result<()> {
    validate_folder(path).or_else(|_| validate_name(path))
}

/// Delete every trigger and shared whose name starts with `path`. No-op when
/// nothing matches.
pub async fn delete_path(store: &dyn RecordStore, organization_id: &str, path: &str) -> Result<u64> {
    validate_prefix(path)?;
    store.delete_by_prefix(organization_id, path).await
}

/// Rename every matching record by substituting the leading `path` with
/// `target`. One atomic store call across both record kinds, so a fan-out
/// rename can never be observed half-applied.
pub async fn move_path(
    store: &dyn RecordStore,
    organization_id: &str,
    path: &str,
    target: &str,
) -> Result<u64> {
    validate_prefix(path)?;
    validate_prefix(target)?;
    store.rename_prefix(organization_id, path, target).await
}

/// Bulk-set `enable` on every matching trigger and shared. Conditions keep
/// their own flags.
pub async fn set_enable_path(
    store: &dyn RecordStore,
    organization_id: &str,
    path: &str,
    enable: bool,
) -> Result<u64> {
    validate_prefix(path)?;
    store.set_enable_by_prefix(organization_id, path, enable).await
}

/// Clone every matching record under `target`. Clones are created disabled;
/// trigger conditions are cloned with fresh ids, keeping their own enable
/// flags. A single-leaf duplicate without an explicit target lands at
/// `<name>-dup`.
pub async fn duplicate_path(
    store: &dyn RecordStore,
    organization_id: &str,
    path: &str,
    target: Option<&str>,
) -> Result<u64> {
    validate_prefix(path)?;
    let target = match target {
        Some(t) => {
            validate_prefix(t)?;
            t.to_string()
        }
        None if validate_name(path).is_ok() => format!("{path}-dup"),
        None => "/dup/".to_string(),
    };

    let triggers = store.triggers_by_prefix(organization_id, path).await?;
    let shareds = store.shareds_by_prefix(organization_id, path).await?;
    let mut created = 0u64;

    for shared in &shareds {
        store
            .create_shared(Shared {
                id: Uuid::new_v4().to_string(),
                organization_id: organization_id.to_string(),
                name: rewrite_prefix(&shared.name, path, &target),
                code: shared.code.clone(),
                enable: false,
            })
            .await?;
        created += 1;
    }

    for trigger in &triggers {
        store
            .create_trigger(Trigger {
                id: Uuid::new_v4().to_string(),
                organization_id: organization_id.to_string(),
                name: rewrite_prefix(&trigger.name, path, &target),
                code: trigger.code.clone(),
                channel: trigger.channel.clone(),
                enable: false,
                conditions: trigger
                    .conditions
                    .iter()
                    .map(|c| Condition {
                        id: Uuid::new_v4().to_string(),
                        name: c.name.clone(),
                        code: c.code.clone(),
                        kind: c.kind,
                        timeout: c.timeout,
                        enable: c.enable,
                    })
                    .collect(),
            })
            .await?;
        created += 1;
    }

    Ok(created)
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleCondition {
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub timeout: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleTrigger {
    pub name: String,
    pub code: String,
    pub channel: String,
    pub conditions: Vec<BundleCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleShared {
    pub name: String,
    pub code: String,
}

/// Serializable snapshot of a subtree, used for backup and transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptBundle {
    pub triggers: Vec<BundleTrigger>,
    pub shareds: Vec<BundleShared>,
}

/// Snapshot every record under `path`. Gated as a *write* operation by the
/// caller: observed policy, kept until product intent says otherwise.
pub async fn export_path(
    store: &dyn RecordStore,
    organization_id: &str,
    path: &str,
) -> Result<ScriptBundle> {
    validate_prefix(path)?;
    let triggers = store.triggers_by_prefix(organization_id, path).await?;
    let shareds = store.shareds_by_prefix(organization_id, path).await?;

    Ok(ScriptBundle {
        triggers: triggers
            .into_iter()
            .map(|t| BundleTrigger {
                name: t.name,
                code: t.code,
                channel: t.channel,
                conditions: t
                    .conditions
                    .into_iter()
                    .map(|c| BundleCondition {
                        name: c.name,
                        code: c.code,
                        kind: c.kind,
                        timeout: c.timeout,
                    })
                    .collect(),
            })
            .collect(),
        shareds: shareds
            .into_iter()
            .map(|s| BundleShared { name: s.name, code: s.code })
            .collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Trigger,
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportResult {
    Fulfilled,
    Rejected,
}

/// Per-item import outcome, tagged with the item's kind and original name so
/// a caller can retry only the failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    #[serde(rename = "type")]
    pub kind: ImportKind,
    pub entity: String,
    pub result: ImportResult,
}

/// Create every bundle entry fresh under `slug`, disabled, with freshly-owned
/// conditions. Items are independent: one failing does not roll back the
/// others, and the outcome list reports each one individually.
pub async fn import_bundle(
    store: &dyn RecordStore,
    organization_id: &str,
    slug: &str,
    bundle: &ScriptBundle,
) -> Result<Vec<ImportOutcome>> {
    validate_folder(slug)?;
    for trigger in &bundle.triggers {
        validate_name(&trigger.name)?;
    }
    for shared in &bundle.shareds {
        validate_name(&shared.name)?;
    }

    let mut outcomes = Vec::with_capacity(bundle.triggers.len() + bundle.shareds.len());

    for trigger in &bundle.triggers {
        let created = store
            .create_trigger(Trigger {
                id: Uuid::new_v4().to_string(),
                organization_id: organization_id.to_string(),
                name: rewrite_under_slug(&trigger.name, slug),
                code: trigger.code.clone(),
                channel: trigger.channel.clone(),
                enable: false,
                conditions: trigger
                    .conditions
                    .iter()
                    .map(|c| Condition {
                        id: Uuid::new_v4().to_string(),
                        name: c.name.clone(),
                        code: c.code.clone(),
                        kind: c.kind,
                        timeout: c.timeout,
                        enable: false,
                    })
                    .collect(),
            })
            .await;
        outcomes.push(ImportOutcome {
            kind: ImportKind::Trigger,
            entity: trigger.name.clone(),
            result: settle(created.map(|_| ()), &trigger.name),
        });
    }

    for shared in &bundle.shareds {
        let created = store
            .create_shared(Shared {
                id: Uuid::new_v4().to_string(),
                organization_id: organization_id.to_string(),
                name: rewrite_under_slug(&shared.name, slug),
                code: shared.code.clone(),
                enable: false,
            })
            .await;
        outcomes.push(ImportOutcome {
            kind: ImportKind::Shared,
            entity: shared.name.clone(),
            result: settle(created.map(|_| ()), &shared.name),
        });
    }

    Ok(outcomes)
}

fn settle(result: Result<()>, name: &str) -> ImportResult {
    match result {
        Ok(()) => ImportResult::Fulfilled,
        Err(err) => {
            tracing::debug!(name, %err, "import item rejected");
            ImportResult::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn trigger(name: &str, enable: bool) -> Trigger {
        Trigger {
            id: Uuid::new_v4().to_string(),
            organization_id: "o1".into(),
            name: name.into(),
            code: "emit()".into(),
            channel: "main".into(),
            enable,
            conditions: vec![Condition {
                id: Uuid::new_v4().to_string(),
                name: "guard".into(),
                code: "true".into(),
                kind: ConditionType::Basic,
                timeout: 100,
                enable: true,
            }],
        }
    }

    fn shared(name: &str, enable: bool) -> Shared {
        Shared {
            id: Uuid::new_v4().to_string(),
            organization_id: "o1".into(),
            name: name.into(),
            code: "lib()".into(),
            enable,
        }
    }

    async fn seed(store: &MemStore) {
        store.create_trigger(trigger("/a/b", true)).await.unwrap();
        store.create_shared(shared("/a/c", false)).await.unwrap();
        store.create_trigger(trigger("/other", true)).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_only_matching_prefix() {
        let store = MemStore::new();
        seed(&store).await;
        let removed = delete_path(&store, "o1", "/a/").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.triggers_by_prefix("o1", "/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_on_empty_prefix_is_noop() {
        let store = MemStore::new();
        seed(&store).await;
        assert_eq!(delete_path(&store, "o1", "/nothing/").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn move_then_move_back_round_trips() {
        let store = MemStore::new();
        seed(&store).await;

        move_path(&store, "o1", "/a/", "/z/").await.unwrap();
        assert!(store.triggers_by_prefix("o1", "/a/").await.unwrap().is_empty());
        assert_eq!(store.triggers_by_prefix("o1", "/z/").await.unwrap()[0].name, "/z/b");

        move_path(&store, "o1", "/z/", "/a/").await.unwrap();
        assert_eq!(store.triggers_by_prefix("o1", "/a/").await.unwrap()[0].name, "/a/b");
        assert_eq!(store.shareds_by_prefix("o1", "/a/").await.unwrap()[0].name, "/a/c");
    }

    #[tokio::test]
    async fn move_rejects_malformed_paths() {
        let store = MemStore::new();
        assert!(move_path(&store, "o1", "a/", "/z/").await.is_err());
        assert!(move_path(&store, "o1", "/a/", "z").await.is_err());
    }

    #[tokio::test]
    async fn duplicate_leaves_source_untouched() {
        let store = MemStore::new();
        seed(&store).await;

        duplicate_path(&store, "o1", "/a/", Some("/copy/")).await.unwrap();

        let originals = store.triggers_by_prefix("o1", "/a/").await.unwrap();
        assert_eq!(originals.len(), 1);
        assert!(originals[0].enable, "source enable must not change");

        let clones = store.triggers_by_prefix("o1", "/copy/").await.unwrap();
        assert_eq!(clones.len(), 1);
        assert_eq!(clones[0].name, "/copy/b");
        assert!(!clones[0].enable, "clone must start disabled");
        assert_ne!(clones[0].id, originals[0].id);
        assert_eq!(clones[0].conditions.len(), 1);
        assert_ne!(clones[0].conditions[0].id, originals[0].conditions[0].id);
        assert!(clones[0].conditions[0].enable, "condition enable is preserved");
    }

    #[tokio::test]
    async fn duplicate_single_leaf_defaults_to_dup_suffix() {
        let store = MemStore::new();
        seed(&store).await;
        duplicate_path(&store, "o1", "/other", None).await.unwrap();
        let found = store.triggers_by_prefix("o1", "/other-dup").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn cascade_disable_then_enable_restores_everything() {
        let store = MemStore::new();
        seed(&store).await;

        set_enable_path(&store, "o1", "/", false).await.unwrap();
        for t in store.triggers_by_prefix("o1", "/").await.unwrap() {
            assert!(!t.enable);
        }

        set_enable_path(&store, "o1", "/", true).await.unwrap();
        for t in store.triggers_by_prefix("o1", "/").await.unwrap() {
            assert!(t.enable);
        }
        for s in store.shareds_by_prefix("o1", "/").await.unwrap() {
            assert!(s.enable);
        }
    }

    #[tokio::test]
    async fn cascade_does_not_touch_condition_flags() {
        let store = MemStore::new();
        seed(&store).await;
        set_enable_path(&store, "o1", "/", false).await.unwrap();
        let t = &store.triggers_by_prefix("o1", "/a/").await.unwrap()[0];
        assert!(t.conditions[0].enable);
    }

    #[tokio::test]
    async fn export_includes_conditions() {
        let store = MemStore::new();
        seed(&store).await;
        let bundle = export_path(&store, "o1", "/a/").await.unwrap();
        assert_eq!(bundle.triggers.len(), 1);
        assert_eq!(bundle.shareds.len(), 1);
        assert_eq!(bundle.triggers[0].conditions.len(), 1);
    }

    #[tokio::test]
    async fn import_reports_each_item_independently() {
        let store = MemStore::new();
        // occupy one of the target names so that item alone fails
        store.create_trigger(trigger("/pack/a", true)).await.unwrap();

        let bundle = ScriptBundle {
            triggers: vec![
                BundleTrigger {
                    name: "/a".into(),
                    code: String::new(),
                    channel: String::new(),
                    conditions: vec![],
                },
                BundleTrigger {
                    name: "/b".into(),
                    code: String::new(),
                    channel: String::new(),
                    conditions: vec![],
                },
            ],
            shareds: vec![BundleShared { name: "/c".into(), code: String::new() }],
        };

        let outcomes = import_bundle(&store, "o1", "/pack/", &bundle).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].result, ImportResult::Rejected);
        assert_eq!(outcomes[1].result, ImportResult::Fulfilled);
        assert_eq!(outcomes[2].result, ImportResult::Fulfilled);
        assert_eq!(outcomes[0].entity, "/a");
        assert_eq!(outcomes[0].kind, ImportKind::Trigger);
        assert_eq!(outcomes[2].kind, ImportKind::Shared);

        let created = store.triggers_by_prefix("o1", "/pack/b").await.unwrap();
        assert_eq!(created.len(), 1);
        assert!(!created[0].enable);
    }

    #[tokio::test]
    async fn import_outcome_is_order_independent() {
        let bundle_ab = ScriptBundle {
            triggers: vec![
                BundleTrigger {
                    name: "/a".into(),
                    code: String::new(),
                    channel: String::new(),
                    conditions: vec![],
                },
                BundleTrigger {
                    name: "/b".into(),
                    code: String::new(),
                    channel: String::new(),
                    conditions: vec![],
                },
            ],
            shareds: vec![],
        };
        let mut bundle_ba = bundle_ab.clone();
        bundle_ba.triggers.reverse();

        for (bundle, taken) in [(&bundle_ab, "/pack/a"), (&bundle_ba, "/pack/a")] {
            let store = MemStore::new();
            store.create_trigger(trigger(taken, true)).await.unwrap();
            let outcomes = import_bundle(&store, "o1", "/pack/", bundle).await.unwrap();
            let failed: Vec<&str> = outcomes
                .iter()
                .filter(|o| o.result == ImportResult::Rejected)
                .map(|o| o.entity.as_str())
                .collect();
            assert_eq!(failed, vec!["/a"], "only the occupied name fails, in any order");
        }
    }

    #[tokio::test]
    async fn import_rejects_bad_slug_before_any_creation() {
        let store = MemStore::new();
        let bundle = ScriptBundle {
            triggers: vec![],
            shareds: vec![BundleShared { name: "/c".into(), code: String::new() }],
        };
        assert!(import_bundle(&store, "o1", "pack", &bundle).await.is_err());
        assert!(store.shareds_by_prefix("o1", "/").await.unwrap().is_empty());
    }
}
