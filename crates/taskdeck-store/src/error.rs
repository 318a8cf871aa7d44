//! Error types for the store

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Table name
        entity: &'static str,
        /// Raw id
        id: u64,
    },

    /// Row id already taken
    #[error("duplicate {entity} {id}")]
    Duplicate {
        /// Table name
        entity: &'static str,
        /// Raw id
        id: u64,
    },

    /// Reference to a missing row
    #[error("{entity} references missing {references} {id}")]
    ForeignKey {
        /// Referencing table
        entity: &'static str,
        /// Referenced table
        references: &'static str,
        /// Missing id
        id: u64,
    },

    /// Lock not acquired in time
    #[error("timed out after {waited_ms}ms waiting for lock on {key}")]
    LockTimeout {
        /// Lock key, for diagnostics
        key: String,
        /// How long we waited
        waited_ms: u64,
    },

    /// Snapshot file IO
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot JSON
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Missing row helper
    #[inline]
    #[must_use]
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Dangling reference helper
    #[inline]
    #[must_use]
    pub fn foreign_key(entity: &'static str, references: &'static str, id: u64) -> Self {
        Self::ForeignKey {
            entity,
            references,
            id,
        }
    }
}
