//! Background completion scheduler: delayed jobs on a fixed worker pool.

mod delay;
mod job;

pub use delay::DelayRange;
pub use job::{CallbackError, FetchCallback, Job, JobDelays};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::domain::{ClientId, TaskId};
use crate::repository::RepositoryFactory;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is shut down")]
    Closed,
}

/// Fixed-size worker pool fed by an unbounded queue.
///
/// - `workers` jobs run at once; a worker is busy for the whole delay of its job.
/// - Submissions never wait or fail because the pool is saturated: they queue.
///   The queue has no bound, so a sustained burst grows memory.
/// - Jobs cannot be cancelled once submitted.
pub struct CompletionScheduler {
    tx: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
    joins: Vec<JoinHandle<()>>,
}

impl CompletionScheduler {
    /// Spawn `workers` workers on the current tokio runtime.
    pub fn spawn(workers: usize, repositories: RepositoryFactory, delays: JobDelays) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let pending = Arc::new(AtomicUsize::new(0));

        let mut joins = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let rx = Arc::clone(&rx);
            let repositories = repositories.clone();
            let pending = Arc::clone(&pending);

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, rx, repositories, delays, pending).await;
            }));
        }

        tracing::info!(workers, "completion scheduler started");
        Self { tx, pending, joins }
    }

    /// After a randomized delay, mark `task_id` done for `client`.
    pub fn schedule_completion(
        &self,
        client: &ClientId,
        task_id: &TaskId,
    ) -> Result<(), SchedulerError> {
        self.submit(Job::Complete {
            client: client.clone(),
            task_id: task_id.clone(),
        })
    }

    /// After `delay` (or a randomized default), read `task_id` and pass it to `callback`.
    pub fn schedule_fetch(
        &self,
        client: &ClientId,
        task_id: &TaskId,
        callback: Option<FetchCallback>,
        delay: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        self.submit(Job::Fetch {
            client: client.clone(),
            task_id: task_id.clone(),
            delay,
            callback,
        })
    }

    /// Jobs submitted but not finished yet (queued or running).
    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn workers(&self) -> usize {
        self.joins.len()
    }

    /// Stop accepting jobs, let the workers drain the queue, and wait for them.
    pub async fn shutdown_and_join(self) {
        drop(self.tx);
        for join in self.joins {
            let _ = join.await;
        }
        tracing::info!("completion scheduler stopped");
    }

    fn submit(&self, job: Job) -> Result<(), SchedulerError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(SchedulerError::Closed);
        }
        Ok(())
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    repositories: RepositoryFactory,
    delays: JobDelays,
    pending: Arc<AtomicUsize>,
) {
    loop {
        // 受信ロックは recv の間だけ保持する（job 実行中は他の worker が受け取れる）
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };
        let kind = job.kind();

        // Run in its own task so a panic (e.g. inside a fetch callback) is caught
        // as a JoinError instead of taking the worker down.
        let outcome = tokio::spawn(job.run(repositories.clone(), delays)).await;
        pending.fetch_sub(1, Ordering::SeqCst);

        if let Err(e) = outcome {
            tracing::warn!(worker_id, job = kind, error = %e, "background job aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CreateTask, TaskView};
    use crate::ports::{SystemClock, TaskRepository, UlidGenerator};
    use crate::store::PartitionedStore;

    fn repositories() -> RepositoryFactory {
        RepositoryFactory::new(
            Arc::new(PartitionedStore::new()),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    fn channel_callback() -> (FetchCallback, tokio::sync::oneshot::Receiver<Option<TaskView>>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let callback: FetchCallback = Box::new(move |task| {
            let _ = tx.send(task);
            Ok(())
        });
        (callback, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn completion_marks_task_done_after_max_delay() {
        let repositories = repositories();
        let scheduler = CompletionScheduler::spawn(4, repositories.clone(), JobDelays::default());
        let repo = repositories.resolve("alice");
        let task = repo.create(CreateTask::new("hello")).await.unwrap();

        scheduler
            .schedule_completion(repo.client_id(), &task.id)
            .unwrap();
        assert!(!repo.get_by_id(&task.id).await.unwrap().done);

        tokio::time::sleep(Duration::from_secs(11)).await;

        let view = repo.get_by_id(&task.id).await.unwrap();
        assert!(view.done);
        assert_eq!(view.response, crate::domain::derive_response("hello"));
        assert_eq!(scheduler.pending_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_after_delete_is_a_no_op() {
        let repositories = repositories();
        let scheduler = CompletionScheduler::spawn(2, repositories.clone(), JobDelays::default());
        let repo = repositories.resolve("alice");
        let task = repo.create(CreateTask::new("hello")).await.unwrap();

        scheduler
            .schedule_completion(repo.client_id(), &task.id)
            .unwrap();
        assert!(repo.delete(&task.id).await);

        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(repo.get_by_id(&task.id).await, None);
        assert!(repo.get_all().await.is_empty());

        // The worker survived and still serves jobs.
        let next = repo.create(CreateTask::new("again")).await.unwrap();
        scheduler
            .schedule_completion(repo.client_id(), &next.id)
            .unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(repo.get_by_id(&next.id).await.unwrap().done);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_uses_the_explicit_delay() {
        let repositories = repositories();
        let scheduler = CompletionScheduler::spawn(1, repositories.clone(), JobDelays::default());
        let repo = repositories.resolve("alice");
        let task = repo.create(CreateTask::new("hello")).await.unwrap();

        let (callback, rx) = channel_callback();
        let started = tokio::time::Instant::now();
        scheduler
            .schedule_fetch(
                repo.client_id(),
                &task.id,
                Some(callback),
                Some(Duration::from_secs(30)),
            )
            .unwrap();

        let fetched = rx.await.unwrap();
        assert_eq!(fetched, Some(task));
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_of_missing_task_reports_none() {
        let repositories = repositories();
        let scheduler = CompletionScheduler::spawn(1, repositories, JobDelays::default());

        let (callback, rx) = channel_callback();
        scheduler
            .schedule_fetch(&ClientId::new("alice"), &TaskId::new("missing"), Some(callback), None)
            .unwrap();

        assert_eq!(rx.await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_and_panicking_callbacks_are_isolated() {
        let repositories = repositories();
        let scheduler = CompletionScheduler::spawn(1, repositories.clone(), JobDelays::default());
        let client = ClientId::new("alice");
        let missing = TaskId::new("missing");

        let failing: FetchCallback = Box::new(|_| Err("boom".into()));
        let panicking: FetchCallback = Box::new(|_| panic!("callback panic"));
        scheduler
            .schedule_fetch(&client, &missing, Some(failing), None)
            .unwrap();
        scheduler
            .schedule_fetch(&client, &missing, Some(panicking), None)
            .unwrap();
        scheduler.schedule_fetch(&client, &missing, None, None).unwrap();

        // The single worker must still be alive for this one.
        let (callback, rx) = channel_callback();
        scheduler
            .schedule_fetch(&client, &missing, Some(callback), None)
            .unwrap();
        assert_eq!(rx.await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_pool_queues_instead_of_rejecting() {
        let repositories = repositories();
        let scheduler = CompletionScheduler::spawn(1, repositories.clone(), JobDelays::default());
        let repo = repositories.resolve("alice");

        let mut ids = Vec::new();
        for i in 0..3 {
            let task = repo.create(CreateTask::new(format!("t{i}"))).await.unwrap();
            scheduler
                .schedule_completion(repo.client_id(), &task.id)
                .unwrap();
            ids.push(task.id);
        }
        assert_eq!(scheduler.pending_jobs(), 3);

        // One worker, three jobs of at most 10 s each.
        tokio::time::sleep(Duration::from_secs(31)).await;

        for id in &ids {
            assert!(repo.get_by_id(id).await.unwrap().done);
        }
        assert_eq!(scheduler.pending_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drains_queued_jobs() {
        let repositories = repositories();
        let scheduler = CompletionScheduler::spawn(2, repositories.clone(), JobDelays::default());
        assert_eq!(scheduler.workers(), 2);
        let repo = repositories.resolve("alice");
        let task = repo.create(CreateTask::new("hello")).await.unwrap();

        scheduler
            .schedule_completion(repo.client_id(), &task.id)
            .unwrap();
        scheduler.shutdown_and_join().await;

        assert!(repo.get_by_id(&task.id).await.unwrap().done);
    }
}
