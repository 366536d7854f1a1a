//! Foreign key reference to another table's field.

/// Foreign key target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Name of the target table
    pub to_table: String,
    /// Field name in target table
    pub to_field: String,
}
