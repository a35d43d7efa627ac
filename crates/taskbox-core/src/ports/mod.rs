//! Ports - 抽象化レイヤー
//!
//! 時刻・ID 生成・repository を trait として切り出し、テストで差し替え可能にする。

pub mod clock;
pub mod id_generator;
pub mod task_repository;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_repository::TaskRepository;
