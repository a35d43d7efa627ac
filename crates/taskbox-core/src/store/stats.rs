use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Live partitions.
    pub clients: usize,
    pub tasks: usize,
    /// Tasks with `done == true`.
    pub completed: usize,
}
