//! Behavior for TEXT values and the backing string pool.
//!
//! Large text is stored once in a [`TextPool`]; the value model carries a
//! [`TextRef`] holding the pool handle and the id. The pool is an
//! injected capability that travels with the value, not global state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tern_common::types::TextId;

use super::behavior::{compare_bytes, TypeOps};
use super::{AttrType, Value, CMP_INCOMPARABLE};

/// Append-only string pool backing TEXT values.
#[derive(Debug, Default)]
pub struct TextPool {
    strings: RwLock<Vec<String>>,
}

impl TextPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty pool with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strings: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    /// Stores a string and returns its id.
    pub fn intern(&self, text: impl Into<String>) -> TextId {
        let mut strings = self.strings.write();
        strings.push(text.into());
        TextId::new((strings.len() - 1) as u32)
    }

    /// Resolves an id to its string. Unknown ids resolve to the empty
    /// string.
    pub fn get(&self, id: TextId) -> String {
        self.strings
            .read()
            .get(id.as_u32() as usize)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of pooled strings.
    pub fn len(&self) -> usize {
        self.strings.read().len()
    }

    /// Returns true if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.strings.read().is_empty()
    }

    /// Stores a string and returns a TEXT value referring to it.
    pub fn make_value(self: &Arc<Self>, text: impl Into<String>) -> Value {
        let id = self.intern(text);
        Value::Text(TextRef::new(id, Arc::clone(self)))
    }
}

/// An out-of-line text handle: a pool id plus the pool it resolves
/// against.
#[derive(Clone)]
pub struct TextRef {
    id: TextId,
    pool: Arc<TextPool>,
}

impl TextRef {
    /// Creates a handle from an id and its owning pool.
    pub fn new(id: TextId, pool: Arc<TextPool>) -> Self {
        Self { id, pool }
    }

    /// The pool id.
    pub fn id(&self) -> TextId {
        self.id
    }

    /// Realizes the referenced string.
    pub fn resolve(&self) -> String {
        self.pool.get(self.id)
    }
}

impl fmt::Debug for TextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextRef({})", self.id)
    }
}

/// Text handles compare by realized content, not by id.
impl PartialEq for TextRef {
    fn eq(&self, other: &Self) -> bool {
        self.resolve() == other.resolve()
    }
}

/// Behavior singleton for [`AttrType::Text`].
pub struct TextOps;

impl TypeOps for TextOps {
    fn attr_type(&self) -> AttrType {
        AttrType::Text
    }

    /// TEXT compares against TEXT or CHAR by realized string content and
    /// byte length, never by the stored handle.
    fn compare(&self, left: &Value, right: &Value) -> i32 {
        match right.attr_type() {
            AttrType::Text | AttrType::Char => {
                let left_str = self.format(left);
                let right_str = right.to_string();
                compare_bytes(left_str.as_bytes(), right_str.as_bytes())
            }
            _ => CMP_INCOMPARABLE,
        }
    }

    fn format(&self, value: &Value) -> String {
        match value {
            Value::Text(handle) => handle.resolve(),
            _ => String::new(),
        }
    }
}
