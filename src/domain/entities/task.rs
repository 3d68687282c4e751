//! Background load task.

use std::sync::Arc;

use crate::domain::ports::DisplayTarget;

use super::ResourceId;

/// A request that missed the memory cache and waits for a worker.
/// Consumed exactly once; never retried.
#[derive(Clone)]
pub struct LoadTask {
    /// The resource being loaded.
    pub id: ResourceId,
    /// The target that asked for it.
    pub target: Arc<dyn DisplayTarget>,
    /// Whether a disk miss may fall through to the network.
    pub fetch_from_network: bool,
}

impl LoadTask {
    /// Creates a new task.
    #[must_use]
    pub fn new(id: ResourceId, target: Arc<dyn DisplayTarget>, fetch_from_network: bool) -> Self {
        Self {
            id,
            target,
            fetch_from_network,
        }
    }
}

impl std::fmt::Debug for LoadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTask")
            .field("id", &self.id)
            .field("fetch_from_network", &self.fetch_from_network)
            .finish_non_exhaustive()
    }
}
