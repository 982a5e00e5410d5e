//! Tunable parameters of the Fog synchronization components.

/// The default number of output indices sent in a single `GetOutputs` query.
pub const DEFAULT_MAX_INDICES_PER_QUERY: usize = 32;

/// Parameters shared by the Fog client components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FogSyncConfig {
    max_indices_per_query: usize,
}

impl FogSyncConfig {
    /// Constructs a configuration. A `max_indices_per_query` of zero is treated as one.
    pub fn new(max_indices_per_query: usize) -> Self {
        FogSyncConfig {
            max_indices_per_query: max_indices_per_query.max(1),
        }
    }

    /// Returns the largest number of output indices sent to the ledger service in one
    /// query.
    pub fn max_indices_per_query(&self) -> usize {
        self.max_indices_per_query
    }
}

impl Default for FogSyncConfig {
    fn default() -> Self {
        FogSyncConfig::new(DEFAULT_MAX_INDICES_PER_QUERY)
    }
}

#[cfg(test)]
mod tests {
    use super::{FogSyncConfig, DEFAULT_MAX_INDICES_PER_QUERY};

    #[test]
    fn zero_chunk_size_is_clamped() {
        assert_eq!(FogSyncConfig::new(0).max_indices_per_query(), 1);
        assert_eq!(
            FogSyncConfig::default().max_indices_per_query(),
            DEFAULT_MAX_INDICES_PER_QUERY
        );
    }
}
