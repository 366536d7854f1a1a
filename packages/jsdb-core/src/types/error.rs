/// Error type for type registration and lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type '{type_id}' already registered")]
    AlreadyRegistered { type_id: String },

    #[error("Unknown type '{type_id}'")]
    UnknownType { type_id: String },

    #[error("Type registry lock poisoned while accessing '{type_id}'")]
    LockPoisoned { type_id: String },
}
