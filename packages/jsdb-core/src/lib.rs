//! Embedded, file-backed, schema-typed JSON row store.
//!
//! Provides the type registry, schema builder, table descriptors, typed
//! rows (beans), and a connection that queries and transactionally commits
//! rows to a single JSON document.

pub mod bean;
pub mod config;
pub mod connection;
pub mod error;
pub mod integrity;
pub mod persistence;
pub mod schema;
pub mod table;
pub mod transaction;
pub mod types;

use std::path::Path;

pub use bean::{Bean, BeanState};
pub use config::DbConfig;
pub use connection::Connection;
pub use error::{ConstraintKind, DbError};
pub use integrity::IntegrityIssue;
pub use schema::{Document, SchemaBuilder};
pub use types::{type_ids, TypeDef, TypeRegistry, Value};

/// Starts a schema with the stock types.
pub fn build() -> SchemaBuilder {
    SchemaBuilder::new()
}

/// Loads a database file with the default configuration.
pub async fn connect(path: impl AsRef<Path>) -> Result<Connection, DbError> {
    Connection::load(path).await
}
