//! In-memory partitioned store.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use super::StoreStats;
use crate::domain::{ClientId, Task};

/// One client's tasks (creation order) plus its last access time.
struct Partition {
    tasks: Vec<Task>,
    last_access: Instant,
}

impl Partition {
    fn new() -> Self {
        Self {
            tasks: Vec::new(),
            last_access: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}

#[derive(Default)]
struct StoreState {
    partitions: HashMap<ClientId, Partition>,
}

/// Every client's partition behind one coarse lock.
///
/// Design:
/// - A single `Mutex` guards all partitions, including partition creation.
///   Per-client locking (a map of client id to lock) is the extension point
///   if contention ever shows up.
/// - Partitions are only reachable through a `StoreGuard`, so no reference to
///   a task can outlive the lock scope.
#[derive(Default)]
pub struct PartitionedStore {
    state: Mutex<StoreState>,
}

impl PartitionedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access for a multi-step operation.
    /// The lock is released when the guard is dropped, on every exit path.
    pub async fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            state: self.state.lock().await,
        }
    }

    /// Drop partitions that have not been accessed for at least `ttl`.
    /// Returns how many were removed.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let before = state.partitions.len();
        state
            .partitions
            .retain(|_, partition| now.duration_since(partition.last_access) < ttl);
        before - state.partitions.len()
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.lock().await;
        let mut stats = StoreStats {
            clients: state.partitions.len(),
            ..StoreStats::default()
        };
        for partition in state.partitions.values() {
            stats.tasks += partition.tasks.len();
            stats.completed += partition.tasks.iter().filter(|t| t.is_done()).count();
        }
        stats
    }
}

/// Scoped handle on the store lock.
pub struct StoreGuard<'a> {
    state: MutexGuard<'a, StoreState>,
}

impl StoreGuard<'_> {
    /// Live partition for `client`, created empty on first access.
    pub fn partition(&mut self, client: &ClientId) -> &mut Vec<Task> {
        let partition = self
            .state
            .partitions
            .entry(client.clone())
            .or_insert_with(Partition::new);
        partition.touch();
        &mut partition.tasks
    }

    /// Replace the whole partition for `client`.
    pub fn set_partition(&mut self, client: &ClientId, tasks: Vec<Task>) {
        let partition = self
            .state
            .partitions
            .entry(client.clone())
            .or_insert_with(Partition::new);
        partition.tasks = tasks;
        partition.touch();
    }

    pub fn contains(&self, client: &ClientId) -> bool {
        self.state.partitions.contains_key(client)
    }
}
