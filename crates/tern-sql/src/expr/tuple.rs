//! The tuple abstraction: a named, ordered sequence of cells exposed
//! uniformly regardless of backing storage.
//!
//! Three backings exist: a table record ([`RowTuple`]), materialized
//! values ([`ValueListTuple`]), and lazily evaluated expressions over an
//! optional inner tuple ([`ExpressionTuple`]).

use std::fmt;

use tern_common::{TernError, TernResult};

use crate::storage::{Record, TableSchema};
use crate::value::Value;

use super::Expression;

/// Qualified name addressing one tuple cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSpec {
    table_name: String,
    field_name: String,
}

impl CellSpec {
    /// Creates a spec for `table.field`.
    pub fn new(table_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            field_name: field_name.into(),
        }
    }

    /// Creates an unqualified spec from an alias.
    pub fn from_alias(alias: impl Into<String>) -> Self {
        Self {
            table_name: String::new(),
            field_name: alias.into(),
        }
    }

    /// The table qualifier, empty when unqualified.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The field name or alias.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The display alias: `table.field`, or just the field when
    /// unqualified.
    pub fn alias(&self) -> String {
        if self.table_name.is_empty() {
            self.field_name.clone()
        } else {
            format!("{}.{}", self.table_name, self.field_name)
        }
    }

    /// Returns true when `other` addresses the same cell: equal aliases,
    /// or equal field names when either side is unqualified.
    pub fn matches(&self, other: &CellSpec) -> bool {
        if self.field_name != other.field_name {
            return false;
        }
        self.table_name == other.table_name
            || self.table_name.is_empty()
            || other.table_name.is_empty()
    }
}

impl fmt::Display for CellSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alias())
    }
}

/// A named, ordered sequence of cells.
pub trait Tuple {
    /// Number of cells.
    fn cell_count(&self) -> usize;

    /// Returns the cell at `index`, failing outside `[0, cell_count)`.
    fn cell_at(&self, index: usize) -> TernResult<Value>;

    /// Returns the spec of the cell at `index`.
    fn spec_at(&self, index: usize) -> TernResult<CellSpec>;

    /// Looks up a cell by qualified name.
    fn find_cell(&self, spec: &CellSpec) -> TernResult<Value>;
}

impl<T: Tuple + ?Sized> Tuple for &T {
    fn cell_count(&self) -> usize {
        (**self).cell_count()
    }

    fn cell_at(&self, index: usize) -> TernResult<Value> {
        (**self).cell_at(index)
    }

    fn spec_at(&self, index: usize) -> TernResult<CellSpec> {
        (**self).spec_at(index)
    }

    fn find_cell(&self, spec: &CellSpec) -> TernResult<Value> {
        (**self).find_cell(spec)
    }
}

fn index_error(index: usize, count: usize) -> TernError {
    TernError::invalid_argument(format!("cell index {} out of range 0..{}", index, count))
}

/// A tuple backed by a table record.
///
/// Borrows the record for exactly one `next()` step of the producing
/// operator; it never owns the record.
pub struct RowTuple<'a> {
    table_name: &'a str,
    schema: &'a TableSchema,
    record: &'a Record,
}

impl<'a> RowTuple<'a> {
    /// Creates a row-backed tuple over a record.
    pub fn new(table_name: &'a str, schema: &'a TableSchema, record: &'a Record) -> Self {
        Self {
            table_name,
            schema,
            record,
        }
    }

    /// The wrapped record.
    pub fn record(&self) -> &Record {
        self.record
    }
}

impl Tuple for RowTuple<'_> {
    fn cell_count(&self) -> usize {
        self.schema.len()
    }

    fn cell_at(&self, index: usize) -> TernResult<Value> {
        self.record
            .value_at(index)
            .cloned()
            .ok_or_else(|| index_error(index, self.cell_count()))
    }

    fn spec_at(&self, index: usize) -> TernResult<CellSpec> {
        let field = self
            .schema
            .fields()
            .get(index)
            .ok_or_else(|| index_error(index, self.cell_count()))?;
        Ok(CellSpec::new(self.table_name, field.name()))
    }

    fn find_cell(&self, spec: &CellSpec) -> TernResult<Value> {
        if !spec.table_name().is_empty() && spec.table_name() != self.table_name {
            return Err(TernError::CellNotFound { cell: spec.alias() });
        }
        self.schema
            .field_index(spec.field_name())
            .and_then(|i| self.record.value_at(i).cloned())
            .ok_or_else(|| TernError::CellNotFound { cell: spec.alias() })
    }
}

/// A tuple of materialized values with externally supplied names.
#[derive(Debug, Clone, Default)]
pub struct ValueListTuple {
    cells: Vec<Value>,
    specs: Vec<CellSpec>,
}

impl ValueListTuple {
    /// Creates an empty tuple.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tuple from cells and their specs.
    pub fn with_cells(cells: Vec<Value>, specs: Vec<CellSpec>) -> Self {
        Self { cells, specs }
    }

    /// Replaces the cell names.
    pub fn set_specs(&mut self, specs: Vec<CellSpec>) {
        self.specs = specs;
    }

    /// Replaces the cell values.
    pub fn set_cells(&mut self, cells: Vec<Value>) {
        self.cells = cells;
    }
}

impl Tuple for ValueListTuple {
    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_at(&self, index: usize) -> TernResult<Value> {
        self.cells
            .get(index)
            .cloned()
            .ok_or_else(|| index_error(index, self.cell_count()))
    }

    fn spec_at(&self, index: usize) -> TernResult<CellSpec> {
        self.specs
            .get(index)
            .cloned()
            .ok_or_else(|| index_error(index, self.specs.len()))
    }

    fn find_cell(&self, spec: &CellSpec) -> TernResult<Value> {
        for (stored, cell) in self.specs.iter().zip(&self.cells) {
            if stored.matches(spec) {
                return Ok(cell.clone());
            }
        }
        Err(TernError::CellNotFound { cell: spec.alias() })
    }
}

/// A tuple computed lazily by evaluating expressions, optionally over a
/// wrapped inner tuple.
///
/// Cell lookup delegates to the inner tuple first, so un-shadowed names
/// from the inner scope pass through transparently. Without an inner
/// tuple, cells can only be produced by constant-foldable expressions.
pub struct ExpressionTuple<'a> {
    expressions: &'a [Expression],
    inner: Option<Box<dyn Tuple + 'a>>,
}

impl<'a> ExpressionTuple<'a> {
    /// Creates an expression-backed tuple with no inner tuple.
    pub fn new(expressions: &'a [Expression]) -> Self {
        Self {
            expressions,
            inner: None,
        }
    }

    /// Attaches the inner tuple the expressions evaluate against.
    pub fn with_inner(mut self, inner: Box<dyn Tuple + 'a>) -> Self {
        self.inner = Some(inner);
        self
    }

    fn get_value(&self, expression: &Expression) -> TernResult<Value> {
        match &self.inner {
            Some(inner) => expression.value(inner.as_ref()),
            None => expression.try_constant(),
        }
    }
}

impl Tuple for ExpressionTuple<'_> {
    fn cell_count(&self) -> usize {
        self.expressions.len()
    }

    fn cell_at(&self, index: usize) -> TernResult<Value> {
        let expression = self
            .expressions
            .get(index)
            .ok_or_else(|| index_error(index, self.cell_count()))?;
        self.get_value(expression)
    }

    fn spec_at(&self, index: usize) -> TernResult<CellSpec> {
        let expression = self
            .expressions
            .get(index)
            .ok_or_else(|| index_error(index, self.cell_count()))?;
        Ok(CellSpec::from_alias(expression.name()))
    }

    fn find_cell(&self, spec: &CellSpec) -> TernResult<Value> {
        if let Some(inner) = &self.inner {
            if let Ok(cell) = inner.find_cell(spec) {
                return Ok(cell);
            }
        }
        for expression in self.expressions {
            if spec.alias() == expression.name() {
                return self.get_value(expression);
            }
        }
        Err(TernError::CellNotFound { cell: spec.alias() })
    }
}
