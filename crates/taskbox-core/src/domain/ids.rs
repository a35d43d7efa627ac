//! Domain identifiers (strongly-typed string IDs).
//!
//! Both identifiers are opaque strings on the wire, but they are kept as
//! distinct newtypes so a client identity can never be passed where a task id
//! is expected (and vice versa).
//!
//! Generated task ids are ULID based (`task-<ULID>`): sortable by creation
//! time and safe to mint concurrently without coordination. Callers may also
//! supply their own id, in which case it is kept verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identity of one client/session. The core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&ClientId> for ClientId {
    fn from(id: &ClientId) -> Self {
        id.clone()
    }
}

/// Identifier of a Task, unique within its client's partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Prefix used for generated ids.
    pub const PREFIX: &'static str = "task-";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(format!("{}{}", Self::PREFIX, ulid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_task_ids_carry_prefix() {
        let ulid = Ulid::new();
        let id = TaskId::from_ulid(ulid);

        assert!(id.as_str().starts_with("task-"));
        assert!(id.as_str().ends_with(&ulid.to_string()));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let client = ClientId::new("session-1");
        let task = TaskId::new("42");

        assert_eq!(serde_json::to_string(&client).unwrap(), "\"session-1\"");
        assert_eq!(serde_json::to_string(&task).unwrap(), "\"42\"");

        let back: TaskId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, task);
    }
}
