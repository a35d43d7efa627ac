//! Client-scoped repositories over the partitioned store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    Attachment, ClientId, CreateTask, Task, TaskError, TaskId, TaskView, UpdateTask,
};
use crate::ports::{Clock, IdGenerator, TaskRepository};
use crate::store::PartitionedStore;

/// Hands out repositories bound to one client identity.
///
/// Every repository resolved for the same identity shares the same store, so
/// they all observe the same partition.
#[derive(Clone)]
pub struct RepositoryFactory {
    store: Arc<PartitionedStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl RepositoryFactory {
    pub fn new(
        store: Arc<PartitionedStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { store, clock, ids }
    }

    pub fn resolve(&self, client: impl Into<ClientId>) -> ClientRepository {
        ClientRepository {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            ids: Arc::clone(&self.ids),
            client: client.into(),
        }
    }

    pub fn store(&self) -> &Arc<PartitionedStore> {
        &self.store
    }
}

/// Entity-level view of one client's partition.
///
/// Each operation holds the store lock from its first read to its last write.
#[derive(Clone)]
pub struct ClientRepository {
    store: Arc<PartitionedStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    client: ClientId,
}

#[async_trait]
impl TaskRepository for ClientRepository {
    fn client_id(&self) -> &ClientId {
        &self.client
    }

    async fn get_all(&self) -> Vec<TaskView> {
        let mut guard = self.store.lock().await;
        guard.partition(&self.client).iter().map(Task::view).collect()
    }

    async fn get_by_id(&self, id: &TaskId) -> Option<TaskView> {
        let mut guard = self.store.lock().await;
        guard
            .partition(&self.client)
            .iter()
            .find(|task| task.id() == id)
            .map(Task::view)
    }

    async fn create(&self, payload: CreateTask) -> Result<TaskView, TaskError> {
        let new_task = payload.validate()?;

        let mut guard = self.store.lock().await;
        let partition = guard.partition(&self.client);

        let id = match &new_task.id {
            Some(id) => {
                if partition.iter().any(|task| task.id() == id) {
                    return Err(TaskError::validation(format!("task {id} already exists")));
                }
                id.clone()
            }
            None => self.ids.generate_task_id(),
        };

        let task = Task::new(id, new_task, self.clock.now());
        let view = task.view();
        partition.push(task);

        tracing::debug!(client = %self.client, task_id = %view.id, "task created");
        Ok(view)
    }

    async fn update(
        &self,
        id: &TaskId,
        payload: UpdateTask,
    ) -> Result<Option<TaskView>, TaskError> {
        let changes = payload.validate()?;

        let mut guard = self.store.lock().await;
        let Some(task) = guard
            .partition(&self.client)
            .iter_mut()
            .find(|task| task.id() == id)
        else {
            return Ok(None);
        };

        task.apply(changes, self.clock.now());
        Ok(Some(task.view()))
    }

    async fn delete(&self, id: &TaskId) -> bool {
        let mut guard = self.store.lock().await;
        let tasks = std::mem::take(guard.partition(&self.client));
        let before = tasks.len();
        let remaining: Vec<Task> = tasks.into_iter().filter(|task| task.id() != id).collect();
        let removed = remaining.len() < before;
        guard.set_partition(&self.client, remaining);

        if removed {
            tracing::debug!(client = %self.client, task_id = %id, "task deleted");
        }
        removed
    }

    async fn get_attachment(&self, id: &TaskId, index: usize) -> Result<Attachment, TaskError> {
        let mut guard = self.store.lock().await;
        let task = guard
            .partition(&self.client)
            .iter()
            .find(|task| task.id() == id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;

        task.attachments()
            .get(index)
            .cloned()
            .ok_or_else(|| TaskError::IndexOutOfRange {
                task_id: id.clone(),
                index,
                len: task.attachments().len(),
            })
    }
}
