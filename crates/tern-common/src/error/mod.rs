//! Error handling for TernDB.
//!
//! This module provides a unified error type and result alias used
//! across all TernDB components.

mod engine;

pub use engine::{ErrorCode, TernError};

/// Result type alias for TernDB operations.
pub type TernResult<T> = std::result::Result<T, TernError>;
