use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskId;
use super::payload::{NewTask, TaskChanges};

/// Fixed text prepended to a task's message to form the synthetic chatbot reply.
pub const RESPONSE_TEMPLATE: &str = "Chatbot reply to: ";

/// Builds the deterministic response for `message`.
pub fn derive_response(message: &str) -> String {
    format!("{RESPONSE_TEMPLATE}{message}")
}

/// Descriptor of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStructure {
    pub filename: String,
    pub content_type: String,
}

impl FileStructure {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }
}

/// One attachment: descriptor + base64 blob, kept as a pair so the two
/// sequences of the request can never drift apart once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub descriptor: FileStructure,
    pub blob: String,
}

impl Attachment {
    pub fn new(descriptor: FileStructure, blob: impl Into<String>) -> Self {
        Self {
            descriptor,
            blob: blob.into(),
        }
    }

    /// Raw bytes of the blob.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.blob)
    }
}

/// A unit of work owned by exactly one partition.
///
/// Only the store mutates it, always under the store lock.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    message: String,
    response: String,
    done: bool,
    attachments: Vec<Attachment>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, new_task: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            message: new_task.message,
            response: String::new(),
            done: false,
            attachments: new_task.attachments,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Merge already-validated changes.
    ///
    /// `response` is re-derived when the message changes or when `done`
    /// flips from false to true (the "chatbot responded" transition).
    pub fn apply(&mut self, changes: TaskChanges, now: DateTime<Utc>) {
        let was_done = self.done;
        let mut respond = false;

        if let Some(message) = changes.message {
            self.message = message;
            respond = true;
        }
        if let Some(done) = changes.done {
            self.done = done;
        }
        if let Some(attachments) = changes.attachments {
            self.attachments = attachments;
        }

        if respond || (!was_done && self.done) {
            self.response = derive_response(&self.message);
        }
        self.updated_at = now;
    }

    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id.clone(),
            message: self.message.clone(),
            response: self.response.clone(),
            done: self.done,
            attachments: self.attachments.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Owned snapshot of a task handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: TaskId,
    pub message: String,
    pub response: String,
    pub done: bool,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
