//! Field flag parsing.

use std::fmt;

use super::definition::KEY_SEPARATOR;
use crate::error::DbError;

/// Decoded field flags.
///
/// Flags are stored as a string of single characters: `c` constant,
/// `r` required, `u` unique, `a` autoincrement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    pub constant: bool,
    pub required: bool,
    pub unique: bool,
    pub autoincrement: bool,
}

impl FieldFlags {
    pub const CONSTANT: char = 'c';
    pub const REQUIRED: char = 'r';
    pub const UNIQUE: char = 'u';
    pub const AUTOINCREMENT: char = 'a';

    /// Flags forced onto primary-key fields.
    pub const PRIMARY_KEY: &'static str = "cru";

    /// Validates and decodes a flag string.
    pub fn parse(flags: &str) -> Result<Self, DbError> {
        let valid = flags.chars().all(|c| {
            c != KEY_SEPARATOR
                && matches!(
                    c,
                    Self::CONSTANT | Self::REQUIRED | Self::UNIQUE | Self::AUTOINCREMENT
                )
        });
        if !valid {
            return Err(DbError::InvalidFlags {
                value: flags.to_string(),
            });
        }
        Ok(Self::from_chars(flags))
    }

    /// Decodes a flag string, ignoring unknown characters.
    pub fn from_chars(flags: &str) -> Self {
        Self {
            constant: flags.contains(Self::CONSTANT),
            required: flags.contains(Self::REQUIRED),
            unique: flags.contains(Self::UNIQUE),
            autoincrement: flags.contains(Self::AUTOINCREMENT),
        }
    }

    /// A field is primary-key eligible when it is constant, required and unique.
    pub fn is_primary_key(&self) -> bool {
        self.constant && self.required && self.unique
    }
}

impl fmt::Display for FieldFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = [
            (self.constant, Self::CONSTANT),
            (self.required, Self::REQUIRED),
            (self.unique, Self::UNIQUE),
            (self.autoincrement, Self::AUTOINCREMENT),
        ];
        for (set, c) in pairs {
            if set {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}
