//! # tern-common
//!
//! Common types, errors, and configuration for TernDB.
//!
//! This crate provides the foundational types and abstractions used across
//! all TernDB components. It includes:
//!
//! - **Types**: Core identifiers (`TableId`, `RowId`, `TextId`)
//! - **Errors**: Unified error handling with `TernError`
//! - **Config**: Engine configuration structures
//!
//! ## Example
//!
//! ```rust
//! use tern_common::types::{RowId, TableId};
//! use tern_common::error::TernResult;
//!
//! fn example() -> TernResult<()> {
//!     let table_id = TableId::new(1);
//!     let row_id = RowId::new(42);
//!     assert!(row_id.is_valid());
//!     assert_eq!(table_id.as_u64(), 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{ErrorCode, TernError, TernResult};
pub use types::{RowId, TableId, TextId};
