//! The database catalog.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tern_common::config::EngineConfig;
use tern_common::{TernError, TernResult};

use crate::value::TextPool;

use super::schema::TableSchema;
use super::table::Table;

/// A database: named tables plus the shared text pool.
#[derive(Debug)]
pub struct Db {
    name: String,
    config: EngineConfig,
    tables: RwLock<HashMap<String, Arc<Table>>>,
    text_pool: Arc<TextPool>,
}

impl Db {
    /// Creates an empty database with default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, EngineConfig::default())
    }

    /// Creates an empty database with the given configuration.
    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Self {
        let text_pool = Arc::new(TextPool::with_capacity(config.text_pool_capacity));
        Self {
            name: name.into(),
            config,
            tables: RwLock::new(HashMap::new()),
            text_pool,
        }
    }

    /// The database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared text pool backing TEXT values.
    pub fn text_pool(&self) -> Arc<TextPool> {
        Arc::clone(&self.text_pool)
    }

    /// Creates a table.
    pub fn create_table(
        &self,
        name: impl Into<String>,
        schema: TableSchema,
    ) -> TernResult<Arc<Table>> {
        let name = name.into();
        let mut tables = self.tables.write();
        if tables.contains_key(&name) {
            return Err(TernError::invalid_argument(format!(
                "table '{}' already exists",
                name
            )));
        }
        let table = Arc::new(Table::with_capacity(
            name.clone(),
            schema,
            self.config.initial_table_capacity,
        ));
        tables.insert(name, Arc::clone(&table));
        Ok(table)
    }

    /// Resolves a table by name.
    pub fn find_table(&self, name: &str) -> TernResult<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TernError::TableNotFound {
                table: name.to_string(),
            })
    }
}
