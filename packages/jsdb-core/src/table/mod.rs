//! Descriptor layer: compiled table and field metadata.

mod compile;
mod field;
mod relation;
#[allow(clippy::module_inception)]
mod table;

pub use compile::{compile, Descriptors};
pub use field::FieldDescriptor;
pub use relation::ForeignKey;
pub use table::TableDescriptor;
