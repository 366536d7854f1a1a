//! Incremental schema construction and export.

use std::path::Path;
use std::sync::Arc;

use crate::config::DbConfig;
use crate::error::DbError;
use crate::persistence::JsonFile;
use crate::table;
use crate::types::TypeRegistry;

use super::definition::{Document, FieldDefinition, TableDefinition};
use super::flags::FieldFlags;
use super::validation::{validate_flags, validate_name, validate_schema};

/// Builds a schema table by table and exports it as an empty database.
///
/// Fields are appended to the most recently added table:
///
/// ```no_run
/// # async fn run() -> Result<(), jsdb_core::error::DbError> {
/// use jsdb_core::schema::SchemaBuilder;
/// use jsdb_core::types::type_ids;
///
/// let mut builder = SchemaBuilder::new();
/// builder
///     .add_table("users")?
///     .add_primary_key("id", type_ids::INTEGER, "a")?
///     .add_field("name", type_ids::STRING, "")?
///     .add_table("posts")?
///     .add_primary_key("id", type_ids::INTEGER, "a")?
///     .add_foreign_key("authorId", "users", "id", "")?;
/// builder.export_to_file("app.json").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    tables: Vec<TableDefinition>,
    /// Index of the table receiving new fields
    current: Option<usize>,
    type_registry: Arc<TypeRegistry>,
    config: DbConfig,
}

impl SchemaBuilder {
    /// Creates a builder that checks types against the stock registry.
    pub fn new() -> Self {
        Self::with_type_registry(Arc::new(TypeRegistry::with_builtin_types()))
    }

    /// Creates a builder that checks types against the given registry.
    pub fn with_type_registry(type_registry: Arc<TypeRegistry>) -> Self {
        Self {
            tables: Vec::new(),
            current: None,
            type_registry,
            config: DbConfig::default(),
        }
    }

    /// Sets the configuration used when writing the exported file.
    pub fn with_config(mut self, config: DbConfig) -> Self {
        self.config = config;
        self
    }

    /// Table definitions added so far.
    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    /// Opens a new table; subsequent fields are added to it.
    pub fn add_table(&mut self, table_name: &str) -> Result<&mut Self, DbError> {
        validate_name(table_name)?;
        if self.tables.iter().any(|t| t.table_name == table_name) {
            return Err(DbError::TableAlreadyExists(table_name.to_string()));
        }
        self.tables.push(TableDefinition::new(table_name));
        self.current = Some(self.tables.len() - 1);
        Ok(self)
    }

    /// Adds a plain field to the current table.
    pub fn add_field(
        &mut self,
        field_name: &str,
        type_id: &str,
        flags: &str,
    ) -> Result<&mut Self, DbError> {
        self.push_field(FieldDefinition {
            field_name: field_name.to_string(),
            type_id: type_id.to_string(),
            flags: flags.to_string(),
            fk: None,
        })
    }

    /// Adds a field referencing `other_table.other_field`.
    ///
    /// The referenced field must already be part of the schema; its type is
    /// copied onto the new field.
    pub fn add_foreign_key(
        &mut self,
        field_name: &str,
        other_table: &str,
        other_field: &str,
        flags: &str,
    ) -> Result<&mut Self, DbError> {
        self.current.ok_or(DbError::NoCurrentTable)?;
        let type_id = self.field_definition(other_table, other_field)?.type_id.clone();
        self.push_field(FieldDefinition {
            field_name: field_name.to_string(),
            type_id,
            flags: flags.to_string(),
            fk: Some((other_table.to_string(), other_field.to_string())),
        })
    }

    /// Adds a field flagged constant, required and unique, plus `flags`.
    pub fn add_primary_key(
        &mut self,
        field_name: &str,
        type_id: &str,
        flags: &str,
    ) -> Result<&mut Self, DbError> {
        let flags = format!("{}{}", FieldFlags::PRIMARY_KEY, flags);
        self.add_field(field_name, type_id, &flags)
    }

    /// Validates the schema and returns the initial, empty document.
    pub fn build(&self) -> Result<Document, DbError> {
        validate_schema(&self.tables)?;
        table::compile(&self.tables, &self.type_registry)?;
        Ok(Document::empty(self.tables.clone()))
    }

    /// Validates the schema and writes an empty database file.
    ///
    /// Nothing is written when validation fails.
    pub async fn export_to_file(&self, path: impl AsRef<Path>) -> Result<Document, DbError> {
        let document = self.build()?;
        let file = JsonFile::new(path.as_ref(), self.config.clone());
        file.write(&document).await?;
        tracing::info!(
            "Exported schema with {} tables to {}",
            document.schema.len(),
            file.path().display()
        );
        Ok(document)
    }

    fn push_field(&mut self, field: FieldDefinition) -> Result<&mut Self, DbError> {
        let index = self.current.ok_or(DbError::NoCurrentTable)?;
        validate_name(&field.field_name)?;
        validate_flags(&field.flags)?;

        let table = &mut self.tables[index];
        if table.fields.iter().any(|f| f.field_name == field.field_name) {
            return Err(DbError::FieldAlreadyExists {
                table: table.table_name.clone(),
                field: field.field_name,
            });
        }
        table.fields.push(field);
        Ok(self)
    }

    fn field_definition(
        &self,
        table_name: &str,
        field_name: &str,
    ) -> Result<&FieldDefinition, DbError> {
        self.tables
            .iter()
            .find(|t| t.table_name == table_name)
            .ok_or_else(|| DbError::TableNotFound {
                table: table_name.to_string(),
            })?
            .field(field_name)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
