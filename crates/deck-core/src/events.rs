//! Event ingest and the process-detail read path.
//!
//! Ingest persists the event and then publishes its id on the global events
//! channel and the organization events channel; everything downstream
//! (dashboards, the execution runtime) learns of new work from those
//! publications, never by polling. Ingest itself does not execute anything.

use chrono::Utc;
use uuid::Uuid;

use crate::broker::{org_events_channel, Broker, GLOBAL_EVENTS_CHANNEL};
use crate::error::{DeckError, Result};
use crate::store::RecordStore;
use crate::types::{Event, EventDetail, EventStatus, ProcessDetail, TriggerRef};

/// Emitter stamped on events posted through the web surface.
pub const WEB_EMITTER: &str = "WEB";

/// How many events a listing returns at most.
pub const EVENT_LIST_LIMIT: usize = 100;

pub struct NewEvent {
    pub name: String,
    pub payload: serde_json::Value,
    pub emitter_code: String,
    pub emitter_name: String,
}

pub async fn ingest(
    store: &dyn RecordStore,
    broker: &dyn Broker,
    organization_id: &str,
    new_event: NewEvent,
) -> Result<Event> {
    let event = Event {
        id: Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        name: new_event.name,
        payload: new_event.payload,
        emitted_at: Utc::now(),
        emitter_code: new_event.emitter_code,
        emitter_name: new_event.emitter_name,
        status: EventStatus::Pending,
    };
    store.insert_event(event.clone()).await?;

    broker.publish(GLOBAL_EVENTS_CHANNEL, &event.id).await;
    broker
        .publish(&org_events_channel(organization_id), &event.id)
        .await;

    tracing::info!(event = %event.id, name = %event.name, "event ingested");
    Ok(event)
}

/// Most recent events, newest first, capped at [`EVENT_LIST_LIMIT`].
pub async fn list_events(store: &dyn RecordStore, organization_id: &str) -> Result<Vec<Event>> {
    store.events_recent(organization_id, EVENT_LIST_LIMIT).await
}

/// One event joined with its processes, their trigger references (weak: the
/// trigger may be gone), logs, and requests.
pub async fn event_detail(
    store: &dyn RecordStore,
    organization_id: &str,
    event_id: &str,
) -> Result<EventDetail> {
    let event = store
        .event_by_id(organization_id, event_id)
        .await?
        .ok_or_else(|| DeckError::EventNotFound(event_id.to_string()))?;

    let processes = store.processes_for_event(organization_id, event_id).await?;
    let mut details = Vec::with_capacity(processes.len());
    for process in processes {
        let trigger = store
            .trigger_by_id(organization_id, &process.trigger_id)
            .await?
            .map(|t| TriggerRef { id: t.id, name: t.name });
        details.push(ProcessDetail { process, trigger });
    }

    Ok(EventDetail { event, processes: details })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InProcessBroker;
    use crate::store::MemStore;
    use crate::types::{Process, Trigger};

    fn new_event(name: &str) -> NewEvent {
        NewEvent {
            name: name.into(),
            payload: serde_json::json!({"n": 1}),
            emitter_code: WEB_EMITTER.into(),
            emitter_name: WEB_EMITTER.into(),
        }
    }

    #[tokio::test]
    async fn ingest_persists_and_publishes_on_both_channels() {
        let store = MemStore::new();
        let broker = InProcessBroker::new();
        let mut global = broker.subscribe(GLOBAL_EVENTS_CHANNEL).await;
        let mut scoped = broker.subscribe(&org_events_channel("o1")).await;

        let event = ingest(&store, &broker, "o1", new_event("chat.message")).await.unwrap();

        assert_eq!(global.recv().await.as_deref(), Some(event.id.as_str()));
        assert_eq!(scoped.recv().await.as_deref(), Some(event.id.as_str()));
        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(list_events(&store, "o1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn detail_joins_processes_and_surviving_triggers() {
        let store = MemStore::new();
        let broker = InProcessBroker::new();
        let event = ingest(&store, &broker, "o1", new_event("tick")).await.unwrap();

        store
            .create_trigger(Trigger {
                id: "t1".into(),
                organization_id: "o1".into(),
                name: "/a/b".into(),
                code: String::new(),
                channel: String::new(),
                enable: true,
                conditions: vec![],
            })
            .await
            .unwrap();
        for trigger_id in ["t1", "deleted-trigger"] {
            store
                .insert_process(Process {
                    id: Uuid::new_v4().to_string(),
                    organization_id: "o1".into(),
                    event_id: event.id.clone(),
                    trigger_id: trigger_id.into(),
                    start_date: Utc::now(),
                    end_date: None,
                    executed: false,
                    error: None,
                    logs: vec![],
                    requests: vec![],
                })
                .await
                .unwrap();
        }

        let detail = event_detail(&store, "o1", &event.id).await.unwrap();
        assert_eq!(detail.processes.len(), 2);
        assert_eq!(detail.processes[0].trigger.as_ref().unwrap().name, "/a/b");
        assert!(detail.processes[1].trigger.is_none(), "weak reference tolerates deletion");
    }

    #[tokio::test]
    async fn detail_of_unknown_event_is_not_found() {
        let store = MemStore::new();
        let err = event_detail(&store, "o1", "nope").await;
        assert!(matches!(err, Err(DeckError::EventNotFound(_))));
    }
}
