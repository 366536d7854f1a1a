//! Compiled table metadata.
//!
//! Each descriptor has:
//! - Positional field descriptors in declaration order
//! - Name to position lookup
//! - The resolved primary key (first constant+required+unique field)

use std::collections::HashMap;

use crate::error::DbError;
use crate::schema::{validate_flags, TableDefinition};
use crate::types::TypeRegistry;

use super::field::FieldDescriptor;
use super::relation::ForeignKey;

/// Immutable runtime view of one table definition.
#[derive(Debug)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,
    /// Field descriptors in declaration order
    fields: Vec<FieldDescriptor>,
    /// Field name to position
    field_indices: HashMap<String, usize>,
    /// Position of the primary key field
    primary_key: usize,
}

impl TableDescriptor {
    /// Compiles a table definition against a type registry.
    ///
    /// # Returns
    /// `Err` for unknown types, invalid flags, duplicate field names or a
    /// missing primary key.
    pub fn from_definition(
        definition: &TableDefinition,
        type_registry: &TypeRegistry,
    ) -> Result<Self, DbError> {
        let mut fields = Vec::with_capacity(definition.fields.len());
        let mut field_indices = HashMap::with_capacity(definition.fields.len());
        let mut primary_key = None;

        for (index, field_def) in definition.fields.iter().enumerate() {
            let flags = validate_flags(&field_def.flags)?;
            let type_def = type_registry.resolve(&field_def.type_id)?;

            if field_indices
                .insert(field_def.field_name.clone(), index)
                .is_some()
            {
                return Err(DbError::FieldAlreadyExists {
                    table: definition.table_name.clone(),
                    field: field_def.field_name.clone(),
                });
            }

            // First match wins
            if flags.is_primary_key() && primary_key.is_none() {
                primary_key = Some(index);
            }

            fields.push(FieldDescriptor {
                name: field_def.field_name.clone(),
                table_name: definition.table_name.clone(),
                index,
                flags,
                type_def,
                foreign_key: field_def.fk.as_ref().map(|(table, field)| ForeignKey {
                    to_table: table.clone(),
                    to_field: field.clone(),
                }),
            });
        }

        let primary_key = primary_key.ok_or_else(|| DbError::MissingPrimaryKey {
            table: definition.table_name.clone(),
        })?;

        Ok(Self {
            name: definition.table_name.clone(),
            fields,
            field_indices,
            primary_key,
        })
    }

    /// Looks up a field by name.
    pub fn field(&self, field_name: &str) -> Result<&FieldDescriptor, DbError> {
        self.field_indices
            .get(field_name)
            .map(|&index| &self.fields[index])
            .ok_or_else(|| DbError::FieldNotFound {
                table: self.name.clone(),
                field: field_name.to_string(),
            })
    }

    /// Looks up a field by position.
    pub fn field_by_index(&self, index: usize) -> Result<&FieldDescriptor, DbError> {
        self.fields.get(index).ok_or_else(|| DbError::FieldNotFound {
            table: self.name.clone(),
            field: format!("#{}", index),
        })
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The field identifying rows of this table.
    pub fn primary_key(&self) -> &FieldDescriptor {
        &self.fields[self.primary_key]
    }

    /// Whether `other` describes the same table with the same fields in the
    /// same order.
    pub fn same_layout(&self, other: &TableDescriptor) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.name == other.name
            && self.primary_key == other.primary_key
            && self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| {
                a.name == b.name
                    && a.type_id() == b.type_id()
                    && a.flags == b.flags
                    && a.foreign_key == b.foreign_key
            })
    }

    pub fn primary_key_name(&self) -> &str {
        &self.fields[self.primary_key].name
    }
}
