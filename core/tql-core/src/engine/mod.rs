//! Database Engine — store handle + schema registry.
//!
//! [`Database`] ties a [`StoreBackend`] to the [`SchemaRegistry`] and the
//! configured defaults. Query operations live on
//! [`Transaction`](crate::api::Transaction), obtained from
//! [`Database::begin`] or [`Database::transaction`].

pub mod config;

pub use config::DatabaseConfig;

use crate::api::Record;
use crate::error::TqlResult;
use crate::schema::{SchemaRegistry, TableKind, TableSchema};
use crate::storage::StoreBackend;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct Database<B: StoreBackend> {
    store: Arc<B>,
    registry: Arc<SchemaRegistry>,
    config: DatabaseConfig,
}

impl<B: StoreBackend> Database<B> {
    /// Wrap a store with an empty registry and default configuration.
    pub fn new(store: B) -> Self {
        Self {
            store: Arc::new(store),
            registry: Arc::new(SchemaRegistry::new()),
            config: DatabaseConfig::default(),
        }
    }

    /// Wrap a store with a validated configuration.
    pub fn with_config(store: B, config: DatabaseConfig) -> TqlResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(store)
        })
    }

    /// Share an existing store and registry, e.g. between several handles.
    pub fn from_parts(
        store: Arc<B>,
        registry: Arc<SchemaRegistry>,
        config: DatabaseConfig,
    ) -> TqlResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            registry,
            config,
        })
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Create the table described by a record type.
    pub fn create_table<R: Record>(&self, kind: TableKind) -> TqlResult<Arc<TableSchema>> {
        self.create_table_with(R::schema(kind)?)
    }

    /// Register a table and create it in the store.
    ///
    /// The registration is rolled back if the store refuses the table.
    #[instrument(skip_all, fields(table = %schema.name(), kind = %schema.kind()))]
    pub fn create_table_with(&self, schema: TableSchema) -> TqlResult<Arc<TableSchema>> {
        let schema = self.registry.register(schema)?;
        if let Err(e) = self.store.create_table(&schema) {
            self.registry.unregister(schema.name());
            return Err(e.into());
        }
        info!(arity = schema.arity(), "table created");
        Ok(schema)
    }

    /// Drop a table from the store and the registry.
    #[instrument(skip(self))]
    pub fn delete_table(&self, table: &str) -> TqlResult<()> {
        self.registry.get(table)?;
        self.store.drop_table(table)?;
        self.registry.unregister(table);
        info!("table deleted");
        Ok(())
    }

    /// Remove every record of a table, keeping its schema.
    #[instrument(skip(self))]
    pub fn clear_table(&self, table: &str) -> TqlResult<()> {
        self.registry.get(table)?;
        self.store.clear_table(table)?;
        info!("table cleared");
        Ok(())
    }
}
