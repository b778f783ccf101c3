//! Backend selection from the environment.
//!
//! One configuration value picks the concrete backend at process start;
//! the choice never changes for the life of the process. Absent or
//! unrecognized values deterministically select the file-backed engine.

use std::env;
use std::path::PathBuf;

// =============================================================================
// Constants
// =============================================================================

/// Selects the backend: `"db"` (or `"database"`) for relational,
/// anything else for file-backed.
pub const STORAGE_ENV: &str = "MINKA_STORAGE";

/// Path of the durable JSON document for the file backend.
pub const FILE_PATH_ENV: &str = "MINKA_FILE_PATH";

/// Connection URL for the relational backend.
pub const DATABASE_URL_ENV: &str = "MINKA_DATABASE_URL";

/// Default durable document path.
pub const FILE_PATH_DEFAULT: &str = "file.json";

// =============================================================================
// Types
// =============================================================================

/// Which concrete backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process store over a JSON document.
    File,
    /// Store over a relational session.
    Database,
}

impl BackendKind {
    fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("db") | Some("database") => Self::Database,
            _ => Self::File,
        }
    }
}

/// Resolved storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Active backend.
    pub backend: BackendKind,
    /// Durable document path (file backend).
    pub file_path: PathBuf,
    /// Connection URL (relational backend).
    pub database_url: Option<String>,
}

impl StorageConfig {
    /// File-backed configuration over an explicit path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::File,
            file_path: path.into(),
            database_url: None,
        }
    }

    /// Relational configuration over an explicit connection URL.
    pub fn database(url: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Database,
            file_path: PathBuf::from(FILE_PATH_DEFAULT),
            database_url: Some(url.into()),
        }
    }

    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let backend = BackendKind::from_value(env::var(STORAGE_ENV).ok().as_deref());
        let file_path = env::var(FILE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(FILE_PATH_DEFAULT));
        let database_url = env::var(DATABASE_URL_ENV).ok();

        let config = Self {
            backend,
            file_path,
            database_url,
        };
        tracing::debug!(backend = ?config.backend, "resolved storage configuration");
        config
    }
}
