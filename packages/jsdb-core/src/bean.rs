//! Typed in-memory rows.

use std::fmt;
use std::sync::Arc;

use crate::error::DbError;
use crate::schema::Row;
use crate::table::TableDescriptor;
use crate::types::Value;

/// Where a bean's data came from, which decides insert versus update on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanState {
    /// Created in memory; committing inserts a row
    New,
    /// Imported from storage or already committed; committing updates its row
    Persisted,
}

/// One table row as logical values.
///
/// A bean holds no reference to the connection it came from. Values are not
/// type checked on `set`; [`Bean::export`] is the single point where every
/// field is checked against its type.
#[derive(Debug, Clone)]
pub struct Bean {
    descriptor: Arc<TableDescriptor>,
    values: Vec<Value>,
    state: BeanState,
}

impl Bean {
    /// Creates a bean with every field null.
    pub fn create_row(descriptor: Arc<TableDescriptor>) -> Self {
        let values = vec![Value::Null; descriptor.field_count()];
        Self {
            descriptor,
            values,
            state: BeanState::New,
        }
    }

    /// Creates a bean from a stored row, deserializing each value.
    ///
    /// # Returns
    /// `Err(DbError::RowShapeMismatch)` if the row length differs from the
    /// field count, or `Err(DbError::DeserializationError)` for the first
    /// value its type rejects. Nothing is partially imported.
    pub fn import(descriptor: Arc<TableDescriptor>, row: &[serde_json::Value]) -> Result<Self, DbError> {
        if row.len() != descriptor.field_count() {
            return Err(DbError::RowShapeMismatch {
                table: descriptor.name.clone(),
                expected: descriptor.field_count(),
                got: row.len(),
            });
        }

        let mut values = Vec::with_capacity(row.len());
        for (field, stored) in descriptor.fields().iter().zip(row) {
            let value = if field.type_def.can_deserialize(stored) {
                field.type_def.deserialize(stored)
            } else {
                None
            };
            let value = value.ok_or_else(|| DbError::DeserializationError {
                table: descriptor.name.clone(),
                field: field.name.clone(),
                expected: field.type_id().to_string(),
                value: stored.to_string(),
            })?;
            values.push(value);
        }

        Ok(Self {
            descriptor,
            values,
            state: BeanState::Persisted,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        &self.descriptor
    }

    pub fn state(&self) -> BeanState {
        self.state
    }

    /// Whether committing this bean inserts a new row.
    pub fn is_new(&self) -> bool {
        self.state == BeanState::New
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.state = BeanState::Persisted;
    }

    /// Returns a field's value; unset fields are `Value::Null`.
    pub fn get(&self, field_name: &str) -> Result<&Value, DbError> {
        let index = self.descriptor.field(field_name)?.index;
        Ok(&self.values[index])
    }

    /// Stores a value without type checking.
    pub fn set(&mut self, field_name: &str, value: impl Into<Value>) -> Result<&mut Self, DbError> {
        let index = self.descriptor.field(field_name)?.index;
        self.values[index] = value.into();
        Ok(self)
    }

    /// Stores several values; stops at the first unknown field name.
    pub fn set_multiple<I, K, V>(&mut self, values: I) -> Result<&mut Self, DbError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (field_name, value) in values {
            self.set(field_name.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Value of the table's primary key field.
    pub fn primary_key_value(&self) -> &Value {
        &self.values[self.descriptor.primary_key().index]
    }

    /// Logical values in field order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Serializes every field into a stored row.
    ///
    /// # Returns
    /// `Err(DbError::SerializationError)` for the first field whose type
    /// rejects its value.
    pub fn export(&self) -> Result<Row, DbError> {
        let mut row = Vec::with_capacity(self.values.len());
        for (field, value) in self.descriptor.fields().iter().zip(&self.values) {
            let stored = if field.type_def.can_serialize(value) {
                field.type_def.serialize(value)
            } else {
                None
            };
            let stored = stored.ok_or_else(|| DbError::SerializationError {
                table: self.descriptor.name.clone(),
                field: field.name.clone(),
                expected: field.type_id().to_string(),
                value: value.to_string(),
            })?;
            row.push(stored);
        }
        Ok(row)
    }
}

impl fmt::Display for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.descriptor.name)?;
        for (i, (field, value)) in self.descriptor.fields().iter().zip(&self.values).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field.name, value)?;
        }
        f.write_str("}")
    }
}
