use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ConditionType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    Basic,
    Throttle,
    Debounce,
}

impl ConditionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::Basic => "BASIC",
            ConditionType::Throttle => "THROTTLE",
            ConditionType::Debounce => "DEBOUNCE",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConditionType {
    type Err = crate::error::DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BASIC" => Ok(ConditionType::Basic),
            "THROTTLE" => Ok(ConditionType::Throttle),
            "DEBOUNCE" => Ok(ConditionType::Debounce),
            _ => Err(crate::error::DeckError::Store(format!(
                "unknown condition type: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Records: Trigger, Condition, Shared
// ---------------------------------------------------------------------------

/// A sub-rule owned by a trigger, evaluated with a timeout by the external
/// execution runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: ConditionType,
    /// Milliseconds.
    pub timeout: i64,
    pub enable: bool,
}

/// A script that reacts to events. Addressed by a slash-delimited path name,
/// unique within its organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub code: String,
    pub channel: String,
    pub enable: bool,
    pub conditions: Vec<Condition>,
}

/// Library code sourced into trigger executions. Shares the path namespace
/// with triggers but has its own uniqueness scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shared {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub code: String,
    pub enable: bool,
}

// ---------------------------------------------------------------------------
// Events & processes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Processing,
    Done,
}

/// An immutable fact ingested into an organization. Only `status` moves after
/// creation, and only the external execution runtime moves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub payload: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
    pub emitter_code: String,
    pub emitter_name: String,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessLog {
    pub date: DateTime<Utc>,
    /// Arbitrary value: boolean, object, or scalar.
    pub log: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub module_code: String,
    pub module_name: String,
    pub method: String,
    pub params: serde_json::Value,
    pub result: serde_json::Value,
    pub notification: bool,
    pub request_date: DateTime<Utc>,
    pub response_date: Option<DateTime<Utc>>,
}

/// One trigger execution in response to one event. The trigger reference is
/// weak: the trigger may have been deleted since.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: String,
    pub organization_id: String,
    pub event_id: String,
    pub trigger_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub executed: bool,
    pub error: Option<String>,
    pub logs: Vec<ProcessLog>,
    pub requests: Vec<ProcessRequest>,
}

/// `event_detail` join payload: a process plus whatever is still known about
/// its trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDetail {
    #[serde(flatten)]
    pub process: Process,
    pub trigger: Option<TriggerRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub processes: Vec<ProcessDetail>,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Per-organization key/value pair. Writes are observed via notification;
/// there is no stored version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub organization_id: String,
    pub key: String,
    pub value: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub read_only: bool,
    pub assigned_by: String,
}

/// Tenant boundary owning records, events, storage, and memberships. An
/// organization without a creator is publicly readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub creator: Option<String>,
    pub members: Vec<Member>,
}

impl Organization {
    pub fn new(id: impl Into<String>, name: impl Into<String>, creator: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            creator,
            members: Vec::new(),
        }
    }
}
