//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! The process bootstrap owns the store through `App`; nothing in the crate
//! reaches it through global state.

use std::sync::Arc;

use crate::app::JanitorLoop;
use crate::config::Config;
use crate::domain::{ClientId, CreateTask, TaskError, TaskView};
use crate::ports::{Clock, IdGenerator, SystemClock, TaskRepository, UlidGenerator};
use crate::repository::{ClientRepository, RepositoryFactory};
use crate::scheduler::CompletionScheduler;
use crate::store::{PartitionedStore, StoreStats};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .config(Config::from_env()?)
///     .build()?;
/// let repo = app.repository("session-1");
/// ```
///
/// # Fail-fast 設計
/// - build() 時に config を検証し、不正なら BuildError を返す
/// - build() は tokio runtime の中で呼ぶこと（worker を spawn するため）
pub struct AppBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("worker pool needs at least one worker")]
    NoWorkers,

    #[error("{name} delay range is inverted (min > max)")]
    InvertedDelay { name: &'static str },

    #[error("janitor interval must be greater than zero")]
    ZeroJanitorInterval,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            clock: None,
            ids: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let config = self.config;
        if config.workers == 0 {
            return Err(BuildError::NoWorkers);
        }
        if !config.completion_delay.is_valid() {
            return Err(BuildError::InvertedDelay { name: "completion" });
        }
        if !config.fetch_delay.is_valid() {
            return Err(BuildError::InvertedDelay { name: "fetch" });
        }
        if config.partition_ttl.is_some() && config.janitor_interval.is_zero() {
            return Err(BuildError::ZeroJanitorInterval);
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));

        let store = Arc::new(PartitionedStore::new());
        let repositories = RepositoryFactory::new(Arc::clone(&store), clock, ids);
        let scheduler =
            CompletionScheduler::spawn(config.workers, repositories.clone(), config.job_delays());
        let janitor = config
            .partition_ttl
            .map(|ttl| JanitorLoop::spawn(Arc::clone(&store), ttl, config.janitor_interval));

        Ok(App {
            repositories,
            scheduler,
            janitor,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App はアプリケーションのランタイム
///
/// The request layer resolves a client identity once per request and passes
/// it in here.
pub struct App {
    repositories: RepositoryFactory,
    scheduler: CompletionScheduler,
    janitor: Option<JanitorLoop>,
}

impl App {
    /// Repository bound to `client`; the same identity always sees the same partition.
    pub fn repository(&self, client: impl Into<ClientId>) -> ClientRepository {
        self.repositories.resolve(client)
    }

    /// Create a task and enqueue its background completion.
    ///
    /// A scheduling failure is logged; the task is created either way.
    pub async fn submit(
        &self,
        client: impl Into<ClientId>,
        payload: CreateTask,
    ) -> Result<TaskView, TaskError> {
        let repo = self.repository(client);
        let view = repo.create(payload).await?;

        if let Err(e) = self.scheduler.schedule_completion(repo.client_id(), &view.id) {
            tracing::warn!(
                client = %repo.client_id(),
                task_id = %view.id,
                error = %e,
                "completion not scheduled"
            );
        }
        Ok(view)
    }

    pub fn scheduler(&self) -> &CompletionScheduler {
        &self.scheduler
    }

    pub async fn stats(&self) -> StoreStats {
        self.repositories.store().stats().await
    }

    /// Stop eviction, then drain every queued background job.
    pub async fn shutdown(self) {
        if let Some(janitor) = self.janitor {
            janitor.shutdown_and_join().await;
        }
        self.scheduler.shutdown_and_join().await;
    }
}
