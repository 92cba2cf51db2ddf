use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream};
use serde::Deserialize;
use std::convert::Infallible;

use deck_core::broker::org_storage_channel;
use deck_core::storage;
use deck_core::types::StorageEntry;

use crate::auth::{require_read, require_write, CurrentUser};
use crate::error::AppError;
use crate::state::AppState;

fn entry_json(entry: &StorageEntry) -> serde_json::Value {
    serde_json::json!({ "key": entry.key, "value": entry.value })
}

#[derive(Deserialize)]
pub struct UpsertBody {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// POST /api/organizations/{org_id}/storage — upsert one key.
pub async fn upsert_storage(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Json(body): Json<UpsertBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_write(&app, &org_id, &user).await?;
    let entry = storage::upsert(
        app.store.as_ref(),
        app.broker.as_ref(),
        &org_id,
        &body.key,
        body.value,
    )
    .await?;
    Ok(Json(entry_json(&entry)))
}

/// GET /api/organizations/{org_id}/storage — every key/value pair.
pub async fn list_storage(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<serde_json::Value>>, AppError> {
    require_read(&app, &org_id, &user).await?;
    let entries = storage::list(app.store.as_ref(), &org_id).await?;
    Ok(Json(entries.iter().map(entry_json).collect()))
}

/// DELETE /api/organizations/{org_id}/storage/{key}
pub async fn delete_storage(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((org_id, key)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    require_write(&app, &org_id, &user).await?;
    storage::delete(app.store.as_ref(), app.broker.as_ref(), &org_id, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/organizations/{org_id}/storage/sse — stream of storage changes.
///
/// Each notification token is a key; the handler re-reads that key and emits
/// the current value. A key that vanished between publish and re-read (a
/// deleted-key race) is skipped, not an error. Slow consumers are dropped:
/// when this connection stops draining and the channel buffer fills, the
/// subscription laggs out and the stream ends.
pub async fn sse_storage(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    require_read(&app, &org_id, &user).await?;

    let sub = app.broker.subscribe(&org_storage_channel(&org_id)).await;
    let store = app.store.clone();

    let stream = stream::unfold(sub, move |mut sub| {
        let store = store.clone();
        let org_id = org_id.clone();
        async move {
            loop {
                let key = sub.recv().await?;
                match store.storage_by_key(&org_id, &key).await {
                    Ok(Some(entry)) => {
                        let data = serde_json::to_string(&entry_json(&entry)).ok()?;
                        return Some((Ok(SseEvent::default().data(data)), sub));
                    }
                    // deleted-key race: nothing to show, wait for the next token
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::debug!(%err, "storage re-read failed, closing stream");
                        return None;
                    }
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
