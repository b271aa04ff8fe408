//! Engine configuration structures.

use serde::{Deserialize, Serialize};

/// Configuration for the in-memory execution engine.
///
/// # Example
///
/// ```rust
/// use tern_common::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial capacity reserved for each table's heap.
    pub initial_table_capacity: usize,

    /// Initial capacity reserved for the shared text pool.
    pub text_pool_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_table_capacity: 1024,
            text_pool_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Creates a minimal configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            initial_table_capacity: 16,
            text_pool_capacity: 8,
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_table_capacity == 0 {
            return Err("initial_table_capacity must be nonzero".to_string());
        }
        if self.text_pool_capacity == 0 {
            return Err("text_pool_capacity must be nonzero".to_string());
        }
        Ok(())
    }
}
