use axum::extract::{Path, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream};
use serde::Deserialize;
use std::convert::Infallible;

use deck_core::broker::org_event_channel;
use deck_core::events::{self, NewEvent, WEB_EMITTER};
use deck_core::types::Event;

use crate::auth::{require_read, require_write, CurrentUser};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EmitBody {
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// POST /api/organizations/{org_id}/event — ingest one event. The execution
/// runtime picks it up from the publication, not from this handler.
pub async fn post_event(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Json(body): Json<EmitBody>,
) -> Result<Json<Event>, AppError> {
    require_write(&app, &org_id, &user).await?;

    let event = events::ingest(
        app.store.as_ref(),
        app.broker.as_ref(),
        &org_id,
        NewEvent {
            name: body.name,
            payload: body.payload,
            emitter_code: WEB_EMITTER.into(),
            emitter_name: WEB_EMITTER.into(),
        },
    )
    .await?;
    Ok(Json(event))
}

/// GET /api/organizations/{org_id}/event — most recent events, newest first.
pub async fn list_events(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<Event>>, AppError> {
    require_read(&app, &org_id, &user).await?;
    let events = events::list_events(app.store.as_ref(), &org_id).await?;
    Ok(Json(events))
}

/// GET /api/organizations/{org_id}/event/{event_id}/sse — stream of the
/// event's process detail, re-read on every processing notification.
///
/// Access is checked once at open. The subscription is owned by the stream:
/// client disconnect or a mid-loop error drops it, which unsubscribes and
/// stops all store reads for this connection.
pub async fn sse_event_detail(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((org_id, event_id)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    require_read(&app, &org_id, &user).await?;
    // 404 up front instead of an eternally silent stream
    events::event_detail(app.store.as_ref(), &org_id, &event_id).await?;

    let sub = app
        .broker
        .subscribe(&org_event_channel(&org_id, &event_id))
        .await;
    let store = app.store.clone();

    let stream = stream::unfold(sub, move |mut sub| {
        let store = store.clone();
        let org_id = org_id.clone();
        let event_id = event_id.clone();
        async move {
            // None = channel closed or this consumer fell behind; end it
            sub.recv().await?;
            match events::event_detail(store.as_ref(), &org_id, &event_id).await {
                Ok(detail) => {
                    let data = serde_json::to_string(&detail).ok()?;
                    Some((Ok(SseEvent::default().data(data)), sub))
                }
                Err(err) => {
                    tracing::debug!(%err, "event detail re-read failed, closing stream");
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
