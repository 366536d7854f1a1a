//! Compiled field metadata.

use std::sync::Arc;

use crate::schema::FieldFlags;
use crate::types::TypeDef;

use super::relation::ForeignKey;

/// Field descriptor within a table.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Name of the owning table
    pub table_name: String,
    /// Position within the table's rows
    pub index: usize,
    /// Decoded flags
    pub flags: FieldFlags,
    /// Resolved type definition
    pub type_def: Arc<dyn TypeDef>,
    /// Referenced table and field, if any
    pub foreign_key: Option<ForeignKey>,
}

impl FieldDescriptor {
    /// Whether the field is constant, required and unique.
    ///
    /// Every such field gets the insert-time uniqueness check, while only the
    /// first one identifies rows.
    pub fn is_primary_key(&self) -> bool {
        self.flags.is_primary_key()
    }

    pub fn is_autoincrement(&self) -> bool {
        self.flags.autoincrement
    }

    pub fn type_id(&self) -> &str {
        self.type_def.type_id()
    }
}
