//! Database error types.

use std::fmt;

use thiserror::Error;

use crate::types::TypeError;

/// Which key constraint a commit violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Inserted value already present in a primary-key column
    PrimaryKey,
    /// Inserted value missing from the referenced column
    ForeignKey,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::PrimaryKey => f.write_str("Primary key"),
            ConstraintKind::ForeignKey => f.write_str("Foreign key"),
        }
    }
}

/// Database operation errors.
#[derive(Error, Debug, Clone)]
pub enum DbError {
    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Field not found in table
    #[error("Field '{field}' not found in table '{table}'")]
    FieldNotFound { table: String, field: String },

    /// Field already exists in table
    #[error("Field '{field}' already exists in table '{table}'")]
    FieldAlreadyExists { table: String, field: String },

    /// Table already exists
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Builder operation issued before any `add_table`
    #[error("There is no current table")]
    NoCurrentTable,

    /// Table or field name is blank or contains the reserved separator
    #[error("Invalid name {value:?}")]
    InvalidName { value: String },

    /// Flag string contains unknown characters or the reserved separator
    #[error("Invalid flags {value:?}")]
    InvalidFlags { value: String },

    /// Table has no field flagged constant, required and unique
    #[error("Table '{table}' is missing a primary key")]
    MissingPrimaryKey { table: String },

    /// Type registry failure (unknown or duplicate type)
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Bean value rejected by its field type at export time
    #[error("Cannot serialize value {value} as type {expected} for field '{field}' in table '{table}'")]
    SerializationError {
        table: String,
        field: String,
        expected: String,
        value: String,
    },

    /// Stored value rejected by its field type at import time
    #[error("Cannot deserialize stored value {value} as type {expected} for field '{field}' in table '{table}'")]
    DeserializationError {
        table: String,
        field: String,
        expected: String,
        value: String,
    },

    /// Stored row length differs from the table's field count
    #[error("Row in table '{table}' has {got} values, expected {expected}")]
    RowShapeMismatch {
        table: String,
        expected: usize,
        got: usize,
    },

    /// Bean built from a table layout other than the connection's
    #[error("Bean layout does not match table '{table}'")]
    DescriptorMismatch { table: String },

    /// Primary-key or foreign-key violation during commit
    #[error("{kind} constraint error: value ({value}) {} ({table},{field})", constraint_verb(.kind))]
    Constraint {
        kind: ConstraintKind,
        table: String,
        field: String,
        value: serde_json::Value,
    },

    /// Constraint comparison attempted on a value that is not an integer, string or boolean
    #[error("Could not compare one or more non-primitives: {left} and {right}")]
    UnsupportedComparison { left: String, right: String },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Database document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Database document could not be encoded
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Loaded document is internally inconsistent
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

fn constraint_verb(kind: &ConstraintKind) -> &'static str {
    match kind {
        ConstraintKind::PrimaryKey => "already exists in",
        ConstraintKind::ForeignKey => "does not exist in",
    }
}

impl DbError {
    /// Returns true for primary-key and foreign-key violations.
    pub fn is_constraint(&self) -> bool {
        matches!(self, DbError::Constraint { .. })
    }

    /// Returns true for schema-shape errors raised by the builder or descriptor compilation.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            DbError::TableNotFound { .. }
                | DbError::FieldNotFound { .. }
                | DbError::FieldAlreadyExists { .. }
                | DbError::TableAlreadyExists(_)
                | DbError::NoCurrentTable
                | DbError::InvalidName { .. }
                | DbError::InvalidFlags { .. }
                | DbError::MissingPrimaryKey { .. }
                | DbError::DescriptorMismatch { .. }
                | DbError::Type(_)
        )
    }

    /// Returns true for file read/write failures.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            DbError::IoError(_) | DbError::TransientIoError(_) | DbError::DiskFull(_)
        )
    }
}
