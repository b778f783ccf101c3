//! The Amenity entity.

use serde::{Deserialize, Serialize};

use crate::model::base::entity_from_map;
use crate::model::{impl_entity, BaseEntity, JsonMap};
use crate::storage::StorageResult;

/// A feature a place can offer (wifi, parking, ...).
///
/// The place side of the many-to-many link lives on
/// [`Place::amenity_ids`](crate::model::Place) — one independent list per
/// place instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    /// Identity and timestamps.
    #[serde(flatten)]
    pub base: BaseEntity,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Attributes from newer builds, preserved verbatim.
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Amenity {
    /// Fresh amenity with a new identity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: BaseEntity::new(),
            name: name.into(),
            extra: JsonMap::new(),
        }
    }

    /// Reconstruct from a previously serialized map.
    ///
    /// # Errors
    /// Returns a serialization error if a known attribute has the wrong shape.
    pub fn from_map(map: JsonMap) -> StorageResult<Self> {
        entity_from_map(map)
    }
}

impl_entity!(Amenity, "Amenity");
