//! taskbox-core
//!
//! Session-scoped, concurrent task store with simulated asynchronous completion.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, payload, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, TaskRepository）
//! - **store**: client ごとに分割された in-memory store（単一ロック）
//! - **repository**: client に束縛された repository と、その factory
//! - **scheduler**: 遅延ジョブを固定数の worker で実行する completion scheduler
//! - **app**: builder / App / janitor
//! - **config**: 環境変数からの設定

pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
pub mod repository;
pub mod scheduler;
pub mod store;

pub use app::{App, AppBuilder, BuildError};
pub use config::{Config, ConfigError};
pub use domain::{
    Attachment, ClientId, CreateTask, FileStructure, TaskError, TaskId, TaskView, UpdateTask,
};
pub use ports::TaskRepository;
pub use repository::{ClientRepository, RepositoryFactory};
pub use scheduler::{CompletionScheduler, DelayRange, FetchCallback, SchedulerError};
pub use store::{PartitionedStore, StoreStats};
