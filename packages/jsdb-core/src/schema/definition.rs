//! Schema and document structs for persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::flags::FieldFlags;
use crate::error::DbError;

/// Reserved character joining table and field names in autoincrement keys.
pub const KEY_SEPARATOR: char = '§';

/// Serialized row: one stored value per field, in declaration order.
pub type Row = Vec<serde_json::Value>;

/// Builds the `meta.autoincrement` key for a table field.
pub fn autoincrement_key(table: &str, field: &str) -> String {
    format!("{}{}{}", table, KEY_SEPARATOR, field)
}

/// Table definition within a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    /// Table name
    pub table_name: String,
    /// Field definitions in declaration order
    pub fields: Vec<FieldDefinition>,
}

impl TableDefinition {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            fields: Vec::new(),
        }
    }

    /// Looks up a field definition by name.
    pub fn field(&self, field_name: &str) -> Result<&FieldDefinition, DbError> {
        self.fields
            .iter()
            .find(|f| f.field_name == field_name)
            .ok_or_else(|| DbError::FieldNotFound {
                table: self.table_name.clone(),
                field: field_name.to_string(),
            })
    }

    /// Returns the first primary-key-eligible field, if any.
    pub fn primary_key(&self) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.is_primary_key())
    }
}

/// Field definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field name
    pub field_name: String,
    /// Type identifier (e.g. "Integer")
    pub type_id: String,
    /// Flag characters, see [`FieldFlags`]
    #[serde(default)]
    pub flags: String,
    /// Foreign key target as `[table, field]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk: Option<(String, String)>,
}

impl FieldDefinition {
    /// Whether the flags mark this field constant, required and unique.
    pub fn is_primary_key(&self) -> bool {
        FieldFlags::from_chars(&self.flags).is_primary_key()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Next value per autoincrement field, keyed by [`autoincrement_key`]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub autoincrement: BTreeMap<String, i64>,
}

/// The persisted unit: schema, metadata and row data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Table definitions in declaration order
    pub schema: Vec<TableDefinition>,
    #[serde(default)]
    pub meta: Meta,
    /// Rows per table name
    pub data: BTreeMap<String, Vec<Row>>,
}

impl Document {
    /// Creates a document with one empty row list per table.
    pub fn empty(schema: Vec<TableDefinition>) -> Self {
        let data = schema
            .iter()
            .map(|table| (table.table_name.clone(), Vec::new()))
            .collect();
        Self {
            schema,
            meta: Meta::default(),
            data,
        }
    }

    /// Rows stored for a table.
    pub fn rows(&self, table: &str) -> Result<&[Row], DbError> {
        self.data
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| DbError::TableNotFound {
                table: table.to_string(),
            })
    }

    /// Allocates the next autoincrement value for a table field.
    ///
    /// Counters start at 0 and are created on first use.
    pub fn next_autoincrement(&mut self, table: &str, field: &str) -> i64 {
        let counter = self
            .meta
            .autoincrement
            .entry(autoincrement_key(table, field))
            .or_insert(0);
        let id = *counter;
        *counter += 1;
        id
    }

    /// Verifies every schema table has a row list.
    pub fn validate_data_tables(&self) -> Result<(), DbError> {
        for table in &self.schema {
            if !self.data.contains_key(&table.table_name) {
                return Err(DbError::DataCorruption(format!(
                    "No row data for table '{}'",
                    table.table_name
                )));
            }
        }
        Ok(())
    }
}
