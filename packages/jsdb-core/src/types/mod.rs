//! Type system: logical values, type definitions, and the type registry.

mod builtin_types;
mod error;
mod type_def;
mod type_registry;
mod value;

pub use builtin_types::{
    register_builtin_types, type_ids, BinaryType, BooleanType, DateType, IntegerType, NumberType,
    StringType,
};
pub use error::TypeError;
pub use type_def::TypeDef;
pub use type_registry::TypeRegistry;
pub use value::Value;
