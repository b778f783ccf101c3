//! Type registry: discriminator string to entity factory.
//!
//! Lets the stores reconstruct arbitrary entity types from a generic
//! durable document without a type switch living inside the engine.
//! Populated once at process start; registering a name twice overwrites
//! the prior factory (last writer wins), acceptable at fixed startup.

use std::collections::HashMap;

use crate::model::{Amenity, City, Entity, JsonMap, Place, Review, State, User};
use crate::storage::{StorageError, StorageResult};

/// Reconstructs one entity from its serialized map (`__class__` already
/// handled by the caller's contract — factories strip it themselves).
pub type EntityFactory = fn(JsonMap) -> StorageResult<Box<dyn Entity>>;

/// Mapping from type discriminator to constructor.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    factories: HashMap<&'static str, EntityFactory>,
}

impl TypeRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in entity type.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("User", |map| Ok(Box::new(User::from_map(map)?)));
        registry.register("State", |map| Ok(Box::new(State::from_map(map)?)));
        registry.register("City", |map| Ok(Box::new(City::from_map(map)?)));
        registry.register("Amenity", |map| Ok(Box::new(Amenity::from_map(map)?)));
        registry.register("Place", |map| Ok(Box::new(Place::from_map(map)?)));
        registry.register("Review", |map| Ok(Box::new(Review::from_map(map)?)));
        registry
    }

    /// Associate a discriminator with a factory. Last writer wins.
    pub fn register(&mut self, name: &'static str, factory: EntityFactory) {
        self.factories.insert(name, factory);
    }

    /// Resolve a discriminator to its factory.
    ///
    /// # Errors
    /// [`StorageError::UnknownType`] if the name was never registered —
    /// reload paths fail loudly on this rather than skipping entries.
    pub fn resolve(&self, name: &str) -> StorageResult<EntityFactory> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| StorageError::unknown_type(name))
    }

    /// Whether a discriminator is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered discriminators, unordered.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}
