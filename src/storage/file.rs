//! FileStore - the file-backed storage engine.
//!
//! Maintains the in-memory registry of live entities and persists it as
//! a single JSON document: top-level keys are `"TypeName.id"`, values
//! are the entities' serialized maps with their `__class__`
//! discriminator. Every save rewrites the whole document; there is no
//! append log.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;

use crate::model::{Entity, CLASS_KEY};
use crate::storage::backend::{EntityMap, Storage};
use crate::storage::registry::TypeRegistry;
use crate::storage::{StorageError, StorageResult};

/// File-backed storage engine.
///
/// The registry map is guarded by one lock; `save` snapshots under it so
/// a torn view is never serialized. Designed for one cooperative unit of
/// work at a time, not for concurrent writers against the same document.
pub struct FileStore {
    path: PathBuf,
    registry: Arc<TypeRegistry>,
    objects: RwLock<HashMap<String, Box<dyn Entity>>>,
}

impl FileStore {
    /// Store over `path` with an empty registry map.
    ///
    /// The document is not touched until `save` or `reload`.
    pub fn new(path: impl Into<PathBuf>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            path: path.into(),
            registry,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Store over `path`, loaded from the durable document.
    ///
    /// A missing document yields an empty store (first run).
    ///
    /// # Errors
    /// Fails on a malformed document or an unresolvable discriminator.
    pub async fn open(
        path: impl Into<PathBuf>,
        registry: Arc<TypeRegistry>,
    ) -> StorageResult<Self> {
        let store = Self::new(path, registry);
        store.reload().await?;
        Ok(store)
    }

    /// Path of the durable document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of registered entities.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

/// Reconstruct one document entry through the registry.
fn entry_to_entity(
    key: &str,
    value: Value,
    registry: &TypeRegistry,
) -> StorageResult<Box<dyn Entity>> {
    let Value::Object(map) = value else {
        return Err(StorageError::load(format!(
            "entry {key} is not a JSON object"
        )));
    };

    let type_name = map
        .get(CLASS_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            StorageError::load(format!("entry {key} has no {CLASS_KEY} discriminator"))
        })?
        .to_string();

    let factory = registry.resolve(&type_name).map_err(|_| {
        StorageError::load(format!("entry {key}: unknown entity type {type_name}"))
    })?;

    factory(map)
}

#[async_trait]
impl Storage for FileStore {
    async fn all(&self, type_name: Option<&str>) -> StorageResult<EntityMap> {
        let objects = self.objects.read().await;
        let snapshot = objects
            .iter()
            .filter(|(_, entity)| type_name.map_or(true, |name| entity.type_name() == name))
            .map(|(key, entity)| (key.clone(), entity.boxed_clone()))
            .collect();
        Ok(snapshot)
    }

    async fn register(&self, entity: Box<dyn Entity>) -> StorageResult<()> {
        // Precondition
        assert!(!entity.id().is_empty(), "entity must have an id");

        self.objects.write().await.insert(entity.key(), entity);
        Ok(())
    }

    async fn save(&self) -> StorageResult<()> {
        // Snapshot under the lock so a torn view is never serialized.
        let document = {
            let objects = self.objects.read().await;
            let mut document = serde_json::Map::with_capacity(objects.len());
            for (key, entity) in objects.iter() {
                document.insert(key.clone(), Value::Object(entity.to_map()?));
            }
            document
        };

        let bytes = serde_json::to_vec_pretty(&Value::Object(document))?;

        // Write-to-temp-then-rename keeps the previous document intact
        // on failure; a truncated document is never observable.
        let tmp = self.temp_path();
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "saved durable document");
        Ok(())
    }

    async fn reload(&self) -> StorageResult<()> {
        let raw = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // First run: the document defines the whole world, and
                // there is no document yet.
                tracing::debug!(path = %self.path.display(), "no durable document, starting empty");
                self.objects.write().await.clear();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let document: serde_json::Map<String, Value> =
            serde_json::from_slice(&raw).map_err(|err| {
                StorageError::load(format!(
                    "malformed durable document {}: {err}",
                    self.path.display()
                ))
            })?;

        let mut next: HashMap<String, Box<dyn Entity>> = HashMap::with_capacity(document.len());
        for (key, value) in document {
            let entity = entry_to_entity(&key, value, &self.registry)?;
            next.insert(entity.key(), entity);
        }

        let count = next.len();
        // Replace, never merge: pre-existing in-memory state is gone.
        *self.objects.write().await = next;

        tracing::debug!(entities = count, path = %self.path.display(), "reloaded durable document");
        Ok(())
    }

    async fn delete(&self, entity: Option<&dyn Entity>) -> StorageResult<()> {
        if let Some(entity) = entity {
            self.objects.write().await.remove(&entity.key());
        }
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.reload().await
    }
}

// =============================================================================
// Tests
// =============================================================================
