//! Schema definitions, flags, validation, and the schema builder.

mod builder;
mod definition;
mod flags;
pub(crate) mod validation;

pub use builder::SchemaBuilder;
pub use definition::{
    autoincrement_key, Document, FieldDefinition, Meta, Row, TableDefinition, KEY_SEPARATOR,
};
pub use flags::FieldFlags;
pub use validation::{validate_flags, validate_name, validate_schema};
