//! Storage - backend trait, implementations, and selection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Storage Trait                          │
//! │        all / register / save / reload / delete / close       │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                              ↑
//!          │                              │
//! ┌────────┴────────┐           ┌────────┴────────┐
//! │    FileStore    │           │  PostgresStore  │
//! │ (JSON document) │           │ (feature-gated) │
//! └─────────────────┘           └─────────────────┘
//! ```
//!
//! Both implementers satisfy the identical contract for
//! `all`/`register`/`delete`; only what "durable" means differs. The
//! [`open`] factory picks the backend once, from [`StorageConfig`].

mod backend;
mod config;
mod error;
mod file;
mod registry;

#[cfg(feature = "postgres")]
mod postgres;

use std::sync::Arc;

pub use backend::{all_of, EntityMap, Storage};
pub use config::{
    BackendKind, StorageConfig, DATABASE_URL_ENV, FILE_PATH_DEFAULT, FILE_PATH_ENV, STORAGE_ENV,
};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use registry::{EntityFactory, TypeRegistry};

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

/// Open the configured backend.
///
/// Called once at process start; the returned handle is the process-wide
/// access point and the backend never changes afterwards. Builds without
/// the `postgres` feature fall back to the file-backed engine.
///
/// # Errors
/// Fails if the durable source cannot be loaded (or, for the relational
/// backend, if no session can be established).
pub async fn open(
    config: &StorageConfig,
    registry: Arc<TypeRegistry>,
) -> StorageResult<Arc<dyn Storage>> {
    match config.backend {
        BackendKind::File => {
            tracing::info!(path = %config.file_path.display(), "opening file-backed storage");
            Ok(Arc::new(FileStore::open(&config.file_path, registry).await?))
        }
        BackendKind::Database => {
            #[cfg(feature = "postgres")]
            {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    StorageError::connection(format!("{DATABASE_URL_ENV} is not set"))
                })?;
                tracing::info!("opening database-backed storage");
                Ok(Arc::new(postgres::PostgresStore::open(url, registry).await?))
            }
            #[cfg(not(feature = "postgres"))]
            {
                tracing::warn!(
                    "database backend requested but built without the `postgres` feature, \
                     using the file-backed engine"
                );
                Ok(Arc::new(FileStore::open(&config.file_path, registry).await?))
            }
        }
    }
}
