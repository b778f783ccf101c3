//! The City entity.

use serde::{Deserialize, Serialize};

use crate::model::base::entity_from_map;
use crate::model::{impl_entity, BaseEntity, JsonMap, Place};
use crate::storage::{all_of, Storage, StorageResult};

/// A city inside a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Identity and timestamps.
    #[serde(flatten)]
    pub base: BaseEntity,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Owning [`State`](crate::model::State) id.
    #[serde(default)]
    pub state_id: String,
    /// Attributes from newer builds, preserved verbatim.
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl City {
    /// Fresh city with a new identity.
    #[must_use]
    pub fn new(name: impl Into<String>, state_id: impl Into<String>) -> Self {
        Self {
            base: BaseEntity::new(),
            name: name.into(),
            state_id: state_id.into(),
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

    /// Places located in this city.
    ///
    /// # Errors
    /// Propagates the store's read error.
    pub async fn places(&self, store: &dyn Storage) -> StorageResult<Vec<Place>> {
        let places = all_of::<Place>(store).await?;
        Ok(places
            .into_iter()
            .filter(|p| p.city_id == self.base.id)
            .collect())
    }
}

impl_entity!(City, "City");
