//! Validation for names, flags and whole schemas.

use std::collections::HashSet;

use super::definition::{TableDefinition, KEY_SEPARATOR};
use super::flags::FieldFlags;
use crate::error::DbError;

/// Validates a table or field name.
///
/// Names must contain a non-whitespace character and must not contain the
/// autoincrement key separator.
pub fn validate_name(name: &str) -> Result<(), DbError> {
    if name.trim().is_empty() || name.contains(KEY_SEPARATOR) {
        return Err(DbError::InvalidName {
            value: name.to_string(),
        });
    }
    Ok(())
}

/// Validates a flag string.
pub fn validate_flags(flags: &str) -> Result<FieldFlags, DbError> {
    FieldFlags::parse(flags)
}

/// Validates that every table has a primary key and that names are unique.
///
/// # Returns
/// `Err(DbError::MissingPrimaryKey)` naming the first table without one.
pub fn validate_schema(schema: &[TableDefinition]) -> Result<(), DbError> {
    let mut table_names = HashSet::new();
    for table in schema {
        if !table_names.insert(table.table_name.as_str()) {
            return Err(DbError::TableAlreadyExists(table.table_name.clone()));
        }

        let mut field_names = HashSet::new();
        for field in &table.fields {
            if !field_names.insert(field.field_name.as_str()) {
                return Err(DbError::FieldAlreadyExists {
                    table: table.table_name.clone(),
                    field: field.field_name.clone(),
                });
            }
        }

        if table.primary_key().is_none() {
            return Err(DbError::MissingPrimaryKey {
                table: table.table_name.clone(),
            });
        }
    }
    Ok(())
}
