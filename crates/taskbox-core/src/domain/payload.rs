//! Create/update payloads and their validation.
//!
//! Payloads arrive in the request layer's shape: descriptors and blobs as two
//! parallel sequences. Validation zips them into `Attachment` pairs, so every
//! length mismatch is rejected here, before the store is touched.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{Attachment, FileStructure, TaskError, TaskId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    /// Caller supplied id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub file_structures: Vec<FileStructure>,
    #[serde(default)]
    pub blobs: Vec<String>,
}

impl CreateTask {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attachment(mut self, descriptor: FileStructure, blob: impl Into<String>) -> Self {
        self.file_structures.push(descriptor);
        self.blobs.push(blob.into());
        self
    }

    pub fn validate(self) -> Result<NewTask, TaskError> {
        let id = match self.id {
            Some(id) if id.trim().is_empty() => {
                return Err(TaskError::validation("id must not be empty"));
            }
            Some(id) => Some(TaskId::new(id)),
            None => None,
        };
        let message = validate_message(self.message)?;
        let attachments = zip_attachments(self.file_structures, self.blobs)?;

        Ok(NewTask {
            id,
            message,
            attachments,
        })
    }
}

/// Partial update: each field is applied only when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub file_structures: Option<Vec<FileStructure>>,
    #[serde(default)]
    pub blobs: Option<Vec<String>>,
}

impl UpdateTask {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    pub fn with_attachments(
        mut self,
        file_structures: Vec<FileStructure>,
        blobs: Vec<String>,
    ) -> Self {
        self.file_structures = Some(file_structures);
        self.blobs = Some(blobs);
        self
    }

    pub fn validate(self) -> Result<TaskChanges, TaskError> {
        let message = self.message.map(validate_message).transpose()?;
        let attachments = match (self.file_structures, self.blobs) {
            (None, None) => None,
            (Some(file_structures), Some(blobs)) => Some(zip_attachments(file_structures, blobs)?),
            _ => {
                return Err(TaskError::validation(
                    "fileStructures and blobs must be supplied together",
                ));
            }
        };

        Ok(TaskChanges {
            message,
            done: self.done,
            attachments,
        })
    }
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: Option<TaskId>,
    pub message: String,
    pub attachments: Vec<Attachment>,
}

/// Validated update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub message: Option<String>,
    pub done: Option<bool>,
    pub attachments: Option<Vec<Attachment>>,
}

fn validate_message(message: String) -> Result<String, TaskError> {
    if message.trim().is_empty() {
        return Err(TaskError::validation("message must not be empty"));
    }
    Ok(message)
}

fn zip_attachments(
    file_structures: Vec<FileStructure>,
    blobs: Vec<String>,
) -> Result<Vec<Attachment>, TaskError> {
    if file_structures.len() != blobs.len() {
        return Err(TaskError::validation(format!(
            "{} file structures but {} blobs",
            file_structures.len(),
            blobs.len()
        )));
    }

    file_structures
        .into_iter()
        .zip(blobs)
        .enumerate()
        .map(|(index, (descriptor, blob))| {
            if descriptor.filename.trim().is_empty() {
                return Err(TaskError::validation(format!(
                    "attachment {index}: filename must not be empty"
                )));
            }
            if let Err(e) = STANDARD.decode(&blob) {
                return Err(TaskError::validation(format!(
                    "attachment {index}: blob is not base64 ({e})"
                )));
            }
            Ok(Attachment::new(descriptor, blob))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pdf() -> FileStructure {
        FileStructure::new("doc.pdf", "application/pdf")
    }

    #[test]
    fn create_zips_attachments_in_order() {
        let new_task = CreateTask::new("hello")
            .with_attachment(FileStructure::new("a.txt", "text/plain"), "YQ==")
            .with_attachment(pdf(), "Yg==")
            .validate()
            .unwrap();

        assert_eq!(new_task.id, None);
        assert_eq!(new_task.attachments.len(), 2);
        assert_eq!(new_task.attachments[0].descriptor.filename, "a.txt");
        assert_eq!(new_task.attachments[1].blob, "Yg==");
    }

    #[rstest]
    #[case::empty_message(CreateTask::new(""))]
    #[case::blank_message(CreateTask::new("   "))]
    #[case::blank_id(CreateTask::new("hello").with_id(" "))]
    #[case::bad_base64(CreateTask::new("hello").with_attachment(pdf(), "not base64!"))]
    #[case::empty_filename(
        CreateTask::new("hello").with_attachment(FileStructure::new("", "text/plain"), "YQ==")
    )]
    #[case::length_mismatch(CreateTask {
        file_structures: vec![pdf(), pdf()],
        blobs: vec!["YQ==".to_string()],
        ..CreateTask::new("hello")
    })]
    fn create_rejects_invalid_payloads(#[case] payload: CreateTask) {
        let err = payload.validate().unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
    }

    #[test]
    fn update_requires_both_attachment_sequences() {
        let payload = UpdateTask {
            file_structures: Some(vec![pdf()]),
            ..UpdateTask::default()
        };
        assert!(matches!(payload.validate(), Err(TaskError::Validation(_))));
    }

    #[test]
    fn update_keeps_absent_fields_absent() {
        let changes = UpdateTask::done(true).validate().unwrap();
        assert_eq!(
            changes,
            TaskChanges {
                message: None,
                done: Some(true),
                attachments: None,
            }
        );
    }

    #[test]
    fn update_can_clear_attachments() {
        let changes = UpdateTask::default()
            .with_attachments(vec![], vec![])
            .validate()
            .unwrap();
        assert_eq!(changes.attachments, Some(vec![]));
    }

    #[test]
    fn payloads_deserialize_from_request_shape() {
        let payload: CreateTask = serde_json::from_value(serde_json::json!({
            "message": "hi",
            "fileStructures": [{"filename": "a.txt", "contentType": "text/plain"}],
            "blobs": ["YQ=="],
        }))
        .unwrap();
        assert_eq!(payload.file_structures[0].content_type, "text/plain");

        let update: UpdateTask = serde_json::from_value(serde_json::json!({"done": true})).unwrap();
        assert_eq!(update, UpdateTask::done(true));
    }
}
