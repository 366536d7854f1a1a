//! Schema to descriptor compilation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DbError;
use crate::schema::TableDefinition;
use crate::types::TypeRegistry;

use super::table::TableDescriptor;

/// Table name to compiled descriptor.
pub type Descriptors = HashMap<String, Arc<TableDescriptor>>;

/// Compiles every table of a schema and checks foreign key targets.
///
/// Deterministic: the same schema and registry always produce equal
/// descriptors.
pub fn compile(
    schema: &[TableDefinition],
    type_registry: &TypeRegistry,
) -> Result<Descriptors, DbError> {
    let mut descriptors = HashMap::with_capacity(schema.len());
    for definition in schema {
        let descriptor = TableDescriptor::from_definition(definition, type_registry)?;
        if descriptors
            .insert(definition.table_name.clone(), Arc::new(descriptor))
            .is_some()
        {
            return Err(DbError::TableAlreadyExists(definition.table_name.clone()));
        }
    }

    // Validate relations (after all tables compiled)
    for descriptor in descriptors.values() {
        for field in descriptor.fields() {
            if let Some(fk) = &field.foreign_key {
                let target =
                    descriptors
                        .get(&fk.to_table)
                        .ok_or_else(|| DbError::TableNotFound {
                            table: fk.to_table.clone(),
                        })?;
                target.field(&fk.to_field)?;
            }
        }
    }

    Ok(descriptors)
}
