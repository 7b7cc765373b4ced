//! Heap configuration.

/// Tuning knobs for an [`ObjectHeap`](crate::ObjectHeap).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Retired objects each pool keeps for reuse.
    pub pool_capacity: usize,
    /// Check table consistency after every mutation made through the property API.
    pub verify_tables: bool,
}

impl HeapConfig {
    pub const DEFAULT_POOL_CAPACITY: usize = 15;

    pub fn new() -> Self {
        HeapConfig {
            pool_capacity: Self::DEFAULT_POOL_CAPACITY,
            verify_tables: cfg!(debug_assertions),
        }
    }

    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_verify_tables(mut self, verify: bool) -> Self {
        self.verify_tables = verify;
        self
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new()
    }
}
