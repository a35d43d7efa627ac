//! Store module: client-partitioned task storage and its observability view.

mod memory;
mod stats;

pub use memory::{PartitionedStore, StoreGuard};
pub use stats::StoreStats;
