//! Transaction visibility contract.
//!
//! The execution core implements no concurrency control of its own. All
//! row-visibility decisions and record mutations are routed through a
//! [`Transaction`] collaborator, which carries its own internal
//! synchronization and is shared by concurrently executing statements.

use tern_common::{TernError, TernResult};

use crate::storage::{Record, Table};

/// The access intent a scan declares when visiting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only access.
    ReadOnly,
    /// Write-intent access (the statement may mutate matched rows).
    ReadWrite,
}

/// The visibility and mutation contract consumed by physical operators.
///
/// `visit_record` answers whether a scanning statement may observe a
/// record under the transaction's isolation rules: `Ok(())` means
/// visible; [`TernError::RecordInvisible`] means "skip, keep scanning";
/// any other error is a hard failure. The delete/insert primitives keep
/// the transaction's own undo bookkeeping consistent; the update
/// operator issues a delete/insert pair rather than mutating in place.
pub trait Transaction: Send + Sync {
    /// Decides whether `record` is visible to this transaction.
    fn visit_record(&self, table: &Table, record: &Record, mode: AccessMode) -> TernResult<()>;

    /// Deletes a record through the transaction.
    fn delete_record(&self, table: &Table, record: &Record) -> TernResult<()>;

    /// Inserts a record through the transaction.
    fn insert_record(&self, table: &Table, record: Record) -> TernResult<()>;
}

/// A transaction without concurrency control.
///
/// Every record is visible, and mutations apply directly to table
/// storage. Statement correctness under concurrency is not guaranteed
/// here; that is the job of a real transaction implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct VacuousTxn;

impl VacuousTxn {
    /// Creates a vacuous transaction.
    pub fn new() -> Self {
        Self
    }
}

impl Transaction for VacuousTxn {
    fn visit_record(&self, _table: &Table, _record: &Record, _mode: AccessMode) -> TernResult<()> {
        Ok(())
    }

    fn delete_record(&self, table: &Table, record: &Record) -> TernResult<()> {
        if !record.rid().is_valid() {
            return Err(TernError::internal("cannot delete a record without a row id"));
        }
        table.delete_row(record.rid())
    }

    fn insert_record(&self, table: &Table, record: Record) -> TernResult<()> {
        table.insert_row(record.into_values()).map(|_| ())
    }
}
