//! The storage trait every backend satisfies.
//!
//! `all`/`register`/`delete` behave identically across backends;
//! `save`/`reload`/`close` differ only in what "durable" means (a JSON
//! document on disk vs. a committed database session). Callers stay
//! backend-oblivious.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{Entity, TypeNamed};
use crate::storage::StorageResult;

/// Registry snapshot: composite key (`"TypeName.id"`) to entity.
pub type EntityMap = HashMap<String, Box<dyn Entity>>;

/// Abstract storage backend for entities.
///
/// One logical unit of work runs between a `reload`/`close` pair. The
/// in-memory registry is shared state guarded internally; concurrent
/// units of work against the same durable target are out of contract.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Every registered entity, or only those of `type_name`.
    ///
    /// Returns clones of the registered entities; an unknown type filter
    /// yields an empty map (a vacuous query, not an error).
    async fn all(&self, type_name: Option<&str>) -> StorageResult<EntityMap>;

    /// Insert or overwrite under the entity's composite key.
    ///
    /// Never fails for a well-formed entity; re-registering the same
    /// key overwrites rather than duplicates.
    async fn register(&self, entity: Box<dyn Entity>) -> StorageResult<()>;

    /// Make the entire in-memory registry durable.
    ///
    /// On failure the previous durable state and the in-memory registry
    /// are both left intact, so a retry is safe.
    async fn save(&self) -> StorageResult<()>;

    /// Replace the in-memory registry with the durable state.
    ///
    /// A missing durable target is first-run steady state (empty
    /// registry, success). A malformed one is a fatal load error.
    async fn reload(&self) -> StorageResult<()>;

    /// Remove the entity's entry if present.
    ///
    /// `None` or an unregistered entity is a no-op, never an error —
    /// cleanup code stays simple.
    async fn delete(&self, entity: Option<&dyn Entity>) -> StorageResult<()>;

    /// End-of-unit-of-work hook; refreshes from the durable source.
    async fn close(&self) -> StorageResult<()>;

    /// Touch-and-persist: refresh `updated_at`, register, then save.
    ///
    /// The only path by which an entity transitions from "constructed"
    /// to "durably persisted".
    async fn persist(&self, entity: &mut dyn Entity) -> StorageResult<()> {
        entity.touch();
        self.register(entity.boxed_clone()).await?;
        self.save().await
    }
}

/// Typed read-back: every registered entity of type `T`.
///
/// A linear read-through query; order is not guaranteed.
///
/// # Errors
/// Propagates the store's read error.
pub async fn all_of<T>(store: &dyn Storage) -> StorageResult<Vec<T>>
where
    T: Entity + TypeNamed + Clone + 'static,
{
    let entities = store.all(Some(T::NAME)).await?;
    Ok(entities
        .into_values()
        .filter_map(|entity| entity.as_any().downcast_ref::<T>().cloned())
        .collect())
}
