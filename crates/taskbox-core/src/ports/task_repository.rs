//! TaskRepository port - entity-level operations for one client.
//!
//! The request layer and the background scheduler only see this contract;
//! `ClientRepository` is the in-memory implementation over the partitioned
//! store.

use async_trait::async_trait;

use crate::domain::{Attachment, ClientId, CreateTask, TaskError, TaskId, TaskView, UpdateTask};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Identity this repository is bound to.
    fn client_id(&self) -> &ClientId;

    /// Snapshot of every task, in creation order.
    async fn get_all(&self) -> Vec<TaskView>;

    async fn get_by_id(&self, id: &TaskId) -> Option<TaskView>;

    /// Validate and append a new pending task.
    async fn create(&self, payload: CreateTask) -> Result<TaskView, TaskError>;

    /// Merge the fields present in `payload`. `Ok(None)` when the id is unknown.
    async fn update(&self, id: &TaskId, payload: UpdateTask)
    -> Result<Option<TaskView>, TaskError>;

    /// Returns whether a task was removed.
    async fn delete(&self, id: &TaskId) -> bool;

    async fn get_attachment(&self, id: &TaskId, index: usize) -> Result<Attachment, TaskError>;
}
