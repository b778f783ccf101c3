//! Storage error types.
//!
//! One error enum for every backend, with helper constructors at the
//! call-site granularity the backends actually need.

use thiserror::Error;

/// Result alias used throughout the storage layer.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by the storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Durable write or read failed at the filesystem level.
    ///
    /// Surfaced by `save()`; in-memory state is left unchanged so the
    /// caller can retry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entity failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The durable document is unreadable: malformed JSON, a non-object
    /// entry, or a type discriminator the registry has never seen.
    ///
    /// Fatal to `reload()` — a corrupt document is a data-integrity
    /// problem, not a transient one.
    #[error("load error: {reason}")]
    Load {
        /// What was wrong with the document.
        reason: String,
    },

    /// A type name could not be resolved through the registry.
    #[error("unknown entity type: {name}")]
    UnknownType {
        /// The unresolvable type name.
        name: String,
    },

    /// Database query or transaction failed.
    #[cfg(feature = "postgres")]
    #[error("database error: {reason}")]
    Database {
        /// Driver-level failure description.
        reason: String,
    },

    /// Could not establish a database session.
    #[cfg(feature = "postgres")]
    #[error("connection error: {reason}")]
    Connection {
        /// Driver-level failure description.
        reason: String,
    },
}

impl StorageError {
    /// Create a load error.
    pub fn load(reason: impl Into<String>) -> Self {
        Self::Load {
            reason: reason.into(),
        }
    }

    /// Create an unknown-type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Create a database error.
    #[cfg(feature = "postgres")]
    pub fn database(reason: impl Into<String>) -> Self {
        Self::Database {
            reason: reason.into(),
        }
    }

    /// Create a connection error.
    #[cfg(feature = "postgres")]
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }
}
