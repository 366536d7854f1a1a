use std::fmt::Debug;

use super::value::Value;

/// Serialization contract for one logical field type.
///
/// `serialize` and `deserialize` return `None` when the input is not
/// acceptable; callers check `can_serialize`/`can_deserialize` first and turn
/// a refusal into an error carrying the field context.
pub trait TypeDef: Debug + Send + Sync {
    /// Identifier stored in the schema (e.g. "Integer").
    fn type_id(&self) -> &str;

    /// Whether a logical value can be written as this type.
    fn can_serialize(&self, value: &Value) -> bool;

    /// Converts a logical value into its stored JSON form.
    fn serialize(&self, value: &Value) -> Option<serde_json::Value>;

    /// Whether a stored JSON value can be read as this type.
    fn can_deserialize(&self, stored: &serde_json::Value) -> bool;

    /// Converts a stored JSON value back into a logical value.
    fn deserialize(&self, stored: &serde_json::Value) -> Option<Value>;
}
