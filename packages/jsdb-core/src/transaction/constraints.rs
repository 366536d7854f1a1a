//! Key comparison used by constraint checks.

use crate::error::DbError;

/// Whether a stored value can take part in key comparisons.
pub fn is_key_comparable(value: &serde_json::Value) -> bool {
    value.is_i64() || value.is_u64() || value.is_string() || value.is_boolean()
}

/// Strict equality over integers, strings and booleans.
///
/// # Returns
/// `Err(DbError::UnsupportedComparison)` if either side is another kind of
/// value (float, null, array, object).
pub fn strictest_equals(
    left: &serde_json::Value,
    right: &serde_json::Value,
) -> Result<bool, DbError> {
    if !is_key_comparable(left) || !is_key_comparable(right) {
        return Err(DbError::UnsupportedComparison {
            left: left.to_string(),
            right: right.to_string(),
        });
    }
    Ok(left == right)
}

/// Returns whether any value yielded by `column` equals `value`.
pub fn column_contains<'a, I>(column: I, value: &serde_json::Value) -> Result<bool, DbError>
where
    I: IntoIterator<Item = &'a serde_json::Value>,
{
    for stored in column {
        if strictest_equals(value, stored)? {
            return Ok(true);
        }
    }
    Ok(false)
}
