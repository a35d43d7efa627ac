//! Background jobs and their isolated execution.

use std::fmt;
use std::time::Duration;

use crate::domain::{ClientId, TaskId, TaskView, UpdateTask};
use crate::ports::TaskRepository;
use crate::repository::RepositoryFactory;

use super::DelayRange;

/// Error type a fetch callback may return. It is logged, never propagated.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Receives the fetched task, or `None` when it no longer exists.
pub type FetchCallback = Box<dyn FnOnce(Option<TaskView>) -> Result<(), CallbackError> + Send>;

/// One unit of background work.
pub enum Job {
    /// Wait, then mark the task done.
    Complete { client: ClientId, task_id: TaskId },

    /// Wait, then read the task and hand it to the callback.
    Fetch {
        client: ClientId,
        task_id: TaskId,
        delay: Option<Duration>,
        callback: Option<FetchCallback>,
    },
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Complete { client, task_id } => f
                .debug_struct("Complete")
                .field("client", client)
                .field("task_id", task_id)
                .finish(),
            Job::Fetch {
                client,
                task_id,
                delay,
                callback,
            } => f
                .debug_struct("Fetch")
                .field("client", client)
                .field("task_id", task_id)
                .field("delay", delay)
                .field("callback", &callback.is_some())
                .finish(),
        }
    }
}

/// Delays a worker draws from.
#[derive(Debug, Clone, Copy)]
pub struct JobDelays {
    pub completion: DelayRange,
    pub fetch: DelayRange,
}

impl Default for JobDelays {
    fn default() -> Self {
        Self {
            completion: DelayRange::completion_default(),
            fetch: DelayRange::fetch_default(),
        }
    }
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Complete { .. } => "complete",
            Job::Fetch { .. } => "fetch",
        }
    }

    /// Sleep, then apply the job through a repository bound to its client.
    ///
    /// Every failure ends here: nothing is returned to the worker.
    pub async fn run(self, repositories: RepositoryFactory, delays: JobDelays) {
        match self {
            Job::Complete { client, task_id } => {
                tokio::time::sleep(delays.completion.sample()).await;

                let repo = repositories.resolve(client);
                match repo.update(&task_id, UpdateTask::done(true)).await {
                    Ok(Some(_)) => {
                        tracing::debug!(client = %repo.client_id(), %task_id, "task completed");
                    }
                    Ok(None) => {
                        tracing::debug!(
                            client = %repo.client_id(),
                            %task_id,
                            "completion skipped, task no longer exists"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            client = %repo.client_id(),
                            %task_id,
                            error = %e,
                            "completion failed"
                        );
                    }
                }
            }
            Job::Fetch {
                client,
                task_id,
                delay,
                callback,
            } => {
                let delay = delay.unwrap_or_else(|| delays.fetch.sample());
                tokio::time::sleep(delay).await;

                let repo = repositories.resolve(client);
                let task = repo.get_by_id(&task_id).await;
                if task.is_none() {
                    tracing::debug!(
                        client = %repo.client_id(),
                        %task_id,
                        "fetched task no longer exists"
                    );
                }

                if let Some(callback) = callback
                    && let Err(e) = callback(task)
                {
                    tracing::warn!(
                        client = %repo.client_id(),
                        %task_id,
                        error = %e,
                        "fetch callback failed"
                    );
                }
            }
        }
    }
}
