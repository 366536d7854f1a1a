use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::error::TypeError;
use super::type_def::TypeDef;
use super::type_registry::TypeRegistry;
use super::value::Value;

/// Identifiers of the stock types.
pub mod type_ids {
    pub const BINARY: &str = "Binary";
    pub const BOOLEAN: &str = "Boolean";
    pub const DATE: &str = "Date";
    pub const INTEGER: &str = "Integer";
    pub const NUMBER: &str = "Number";
    pub const STRING: &str = "String";
}

/// UTF-8 text, stored as a JSON string.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringType;

impl TypeDef for StringType {
    fn type_id(&self) -> &str {
        type_ids::STRING
    }

    fn can_serialize(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }

    fn serialize(&self, value: &Value) -> Option<serde_json::Value> {
        value.as_str().map(serde_json::Value::from)
    }

    fn can_deserialize(&self, stored: &serde_json::Value) -> bool {
        stored.is_string()
    }

    fn deserialize(&self, stored: &serde_json::Value) -> Option<Value> {
        stored.as_str().map(Value::from)
    }
}

/// Stored as a JSON boolean.
#[derive(Debug, Default, Clone, Copy)]
pub struct BooleanType;

impl TypeDef for BooleanType {
    fn type_id(&self) -> &str {
        type_ids::BOOLEAN
    }

    fn can_serialize(&self, value: &Value) -> bool {
        matches!(value, Value::Boolean(_))
    }

    fn serialize(&self, value: &Value) -> Option<serde_json::Value> {
        value.as_bool().map(serde_json::Value::from)
    }

    fn can_deserialize(&self, stored: &serde_json::Value) -> bool {
        stored.is_boolean()
    }

    fn deserialize(&self, stored: &serde_json::Value) -> Option<Value> {
        stored.as_bool().map(Value::Boolean)
    }
}

/// Whole numbers in the i64 range. Integral floats such as `3.0` are
/// accepted and stored as integers.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerType;

impl TypeDef for IntegerType {
    fn type_id(&self) -> &str {
        type_ids::INTEGER
    }

    fn can_serialize(&self, value: &Value) -> bool {
        whole_number(value).is_some()
    }

    fn serialize(&self, value: &Value) -> Option<serde_json::Value> {
        whole_number(value).map(serde_json::Value::from)
    }

    fn can_deserialize(&self, stored: &serde_json::Value) -> bool {
        stored.as_i64().is_some()
    }

    fn deserialize(&self, stored: &serde_json::Value) -> Option<Value> {
        stored.as_i64().map(Value::Integer)
    }
}

/// Integer value of `value` if it is a whole number within i64 range.
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        // 2^63 is exact as f64; anything below it fits
        Value::Number(n) if n.fract() == 0.0 && *n >= -(2f64.powi(63)) && *n < 2f64.powi(63) => {
            Some(*n as i64)
        }
        _ => None,
    }
}

/// Finite numbers, integer or floating point. NaN and infinities are
/// rejected since JSON cannot represent them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberType;

impl TypeDef for NumberType {
    fn type_id(&self) -> &str {
        type_ids::NUMBER
    }

    fn can_serialize(&self, value: &Value) -> bool {
        value.as_f64().is_some_and(f64::is_finite)
    }

    fn serialize(&self, value: &Value) -> Option<serde_json::Value> {
        let n = value.as_f64()?;
        serde_json::Number::from_f64(n).map(serde_json::Value::Number)
    }

    fn can_deserialize(&self, stored: &serde_json::Value) -> bool {
        stored.is_number()
    }

    fn deserialize(&self, stored: &serde_json::Value) -> Option<Value> {
        stored.as_f64().map(Value::Number)
    }
}

/// UTC timestamps, stored as integer epoch milliseconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateType;

impl TypeDef for DateType {
    fn type_id(&self) -> &str {
        type_ids::DATE
    }

    fn can_serialize(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }

    fn serialize(&self, value: &Value) -> Option<serde_json::Value> {
        value
            .as_date()
            .map(|date| serde_json::Value::from(date.timestamp_millis()))
    }

    fn can_deserialize(&self, stored: &serde_json::Value) -> bool {
        stored
            .as_i64()
            .is_some_and(|millis| Utc.timestamp_millis_opt(millis).single().is_some())
    }

    fn deserialize(&self, stored: &serde_json::Value) -> Option<Value> {
        let millis = stored.as_i64()?;
        Utc.timestamp_millis_opt(millis).single().map(Value::Date)
    }
}

/// Reserved for raw byte fields. No storage encoding is defined yet, so the
/// type refuses every value in both directions.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryType;

impl TypeDef for BinaryType {
    fn type_id(&self) -> &str {
        type_ids::BINARY
    }

    fn can_serialize(&self, _value: &Value) -> bool {
        false
    }

    fn serialize(&self, _value: &Value) -> Option<serde_json::Value> {
        None
    }

    fn can_deserialize(&self, _stored: &serde_json::Value) -> bool {
        false
    }

    fn deserialize(&self, _stored: &serde_json::Value) -> Option<Value> {
        None
    }
}

/// Registers all built-in types in the registry.
///
/// # Arguments
/// * `registry` - Type registry to populate
///
/// # Returns
/// `Ok(())` if all types registered successfully.
pub fn register_builtin_types(registry: &TypeRegistry) -> Result<(), TypeError> {
    for type_def in builtin_types() {
        registry.register(type_def)?;
    }
    Ok(())
}

/// Instances of every stock type.
pub(crate) fn builtin_types() -> Vec<Arc<dyn TypeDef>> {
    vec![
        Arc::new(BinaryType),
        Arc::new(BooleanType),
        Arc::new(DateType),
        Arc::new(IntegerType),
        Arc::new(NumberType),
        Arc::new(StringType),
    ]
}
