//! Access guard: organization membership checks consulted before any store
//! work. Read and write are deliberately asymmetric — a creatorless
//! organization is publicly readable but writable by nobody.

use crate::error::Result;
use crate::store::RecordStore;

/// True iff the organization has no creator, the user is the creator, or the
/// user appears in the membership list with any role.
pub async fn has_read_access(
    store: &dyn RecordStore,
    organization_id: &str,
    user_id: &str,
) -> Result<bool> {
    let Some(org) = store.organization(organization_id).await? else {
        return Ok(false);
    };
    match &org.creator {
        None => Ok(true),
        Some(creator) if creator == user_id => Ok(true),
        Some(_) => Ok(org.members.iter().any(|m| m.user_id == user_id)),
    }
}

/// True iff the user is the creator or a member whose `read_only` flag is
/// false. Absence from the membership list is write-denied.
pub async fn has_write_access(
    store: &dyn RecordStore,
    organization_id: &str,
    user_id: &str,
) -> Result<bool> {
    let Some(org) = store.organization(organization_id).await? else {
        return Ok(false);
    };
    if org.creator.as_deref() == Some(user_id) {
        return Ok(true);
    }
    Ok(org
        .members
        .iter()
        .any(|m| m.user_id == user_id && !m.read_only))
}
