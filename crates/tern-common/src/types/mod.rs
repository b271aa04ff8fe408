//! Core types for TernDB.

mod ids;

pub use ids::{RowId, TableId, TextId};
