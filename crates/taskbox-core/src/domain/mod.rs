//! Domain model (IDs, tasks, payloads, errors).

pub mod errors;
pub mod ids;
pub mod payload;
pub mod task;

pub use errors::TaskError;
pub use ids::{ClientId, TaskId};
pub use payload::{CreateTask, NewTask, TaskChanges, UpdateTask};
pub use task::{Attachment, FileStructure, RESPONSE_TEMPLATE, Task, TaskView, derive_response};
