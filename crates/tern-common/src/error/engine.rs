//! Engine error types.
//!
//! Provides the error types shared by all query-execution components.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Operation not supported.
    NotSupported = 0x0002,
    /// Invalid argument provided.
    InvalidArgument = 0x0003,

    // Catalog errors (0x0100 - 0x01FF)
    /// Table not found.
    TableNotFound = 0x0100,
    /// Column not found.
    ColumnNotFound = 0x0101,
    /// Tuple cell not found.
    CellNotFound = 0x0102,
    /// Index not found.
    IndexNotFound = 0x0103,

    // Value errors (0x0200 - 0x02FF)
    /// Type mismatch.
    TypeMismatch = 0x0200,

    // Execution errors (0x0300 - 0x03FF)
    /// Record is not visible to the current transaction.
    RecordInvisible = 0x0300,
    /// Query execution failed.
    ExecutionFailed = 0x0301,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Catalog",
            0x02 => "Value",
            0x03 => "Execution",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for TernDB.
///
/// This enum covers all errors that can occur while binding and executing
/// a statement. Each variant includes relevant context for debugging.
///
/// # Example
///
/// ```rust
/// use tern_common::error::{TernError, TernResult};
///
/// fn find_table(name: &str) -> TernResult<()> {
///     Err(TernError::TableNotFound { table: name.to_string() })
/// }
/// ```
#[derive(Debug, Error)]
pub enum TernError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Operation not supported.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Catalog Errors
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Column not found.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table name.
        table: String,
    },

    /// Tuple cell not found.
    #[error("cell '{cell}' not found in tuple")]
    CellNotFound {
        /// The missing cell's qualified name.
        cell: String,
    },

    /// Index not found.
    #[error("index '{index}' not found on table '{table}'")]
    IndexNotFound {
        /// The missing index.
        index: String,
        /// The table name.
        table: String,
    },

    // ==========================================================================
    // Value Errors
    // ==========================================================================
    /// Type mismatch.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    // ==========================================================================
    // Execution Errors
    // ==========================================================================
    /// Record is not visible to the current transaction.
    ///
    /// This is a control-flow signal, not a failure: scan operators absorb
    /// it and continue with the next record. Every other consumer must
    /// propagate it unchanged.
    #[error("record is not visible to the current transaction")]
    RecordInvisible,

    /// Query execution failed.
    #[error("query execution failed: {reason}")]
    ExecutionFailed {
        /// Reason for failure.
        reason: String,
    },
}

impl TernError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::NotSupported { .. } => ErrorCode::NotSupported,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::CellNotFound { .. } => ErrorCode::CellNotFound,
            Self::IndexNotFound { .. } => ErrorCode::IndexNotFound,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::RecordInvisible => ErrorCode::RecordInvisible,
            Self::ExecutionFailed { .. } => ErrorCode::ExecutionFailed,
        }
    }

    /// Returns true if this error is a not-found lookup miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TableNotFound { .. }
                | Self::ColumnNotFound { .. }
                | Self::CellNotFound { .. }
                | Self::IndexNotFound { .. }
        )
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a not-supported error.
    #[must_use]
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
        }
    }

    /// Creates an execution-failed error.
    #[must_use]
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
        }
    }
}
