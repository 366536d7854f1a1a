use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::builtin_types::builtin_types;
use super::error::TypeError;
use super::type_def::TypeDef;

/// Registry for field types.
///
/// Stores registered types with lookup by type identifier.
/// Provides thread-safe registration and retrieval.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Arc<dyn TypeDef>>>,
}

impl TypeRegistry {
    /// Creates a new empty type registry.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry holding the stock types.
    pub fn with_builtin_types() -> Self {
        let types = builtin_types()
            .into_iter()
            .map(|type_def| (type_def.type_id().to_string(), type_def))
            .collect();
        Self {
            types: RwLock::new(types),
        }
    }

    /// Registers a type definition under its own identifier.
    ///
    /// # Returns
    /// `Ok(())` if successful, `Err(TypeError)` if the identifier is taken.
    pub fn register(&self, type_def: Arc<dyn TypeDef>) -> Result<(), TypeError> {
        let type_id = type_def.type_id().to_string();
        let mut types = self.types.write().map_err(|_| TypeError::LockPoisoned {
            type_id: type_id.clone(),
        })?;

        if types.contains_key(&type_id) {
            return Err(TypeError::AlreadyRegistered { type_id });
        }

        types.insert(type_id, type_def);
        Ok(())
    }

    /// Resolves a type identifier to its definition.
    ///
    /// # Returns
    /// `Err(TypeError::UnknownType)` for unregistered identifiers.
    pub fn resolve(&self, type_id: &str) -> Result<Arc<dyn TypeDef>, TypeError> {
        let types = self.types.read().map_err(|_| TypeError::LockPoisoned {
            type_id: type_id.to_string(),
        })?;
        types
            .get(type_id)
            .cloned()
            .ok_or_else(|| TypeError::UnknownType {
                type_id: type_id.to_string(),
            })
    }

    /// Checks if a type is registered.
    pub fn contains(&self, type_id: &str) -> bool {
        let types = match self.types.read() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        types.contains_key(type_id)
    }

    /// Returns all registered type identifiers, sorted.
    pub fn type_ids(&self) -> Vec<String> {
        let types = match self.types.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let mut ids: Vec<String> = types.keys().cloned().collect();
        ids.sort();
        ids
    }
}
