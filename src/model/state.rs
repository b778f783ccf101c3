//! The State entity.

use serde::{Deserialize, Serialize};

use crate::model::base::entity_from_map;
use crate::model::{impl_entity, BaseEntity, City, JsonMap};
use crate::storage::{all_of, Storage, StorageResult};

/// A top-level geographic region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
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

impl State {
    /// Fresh state with a new identity.
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

    /// Cities belonging to this state.
    ///
    /// # Errors
    /// Propagates the store's read error.
    pub async fn cities(&self, store: &dyn Storage) -> StorageResult<Vec<City>> {
        let cities = all_of::<City>(store).await?;
        Ok(cities
            .into_iter()
            .filter(|c| c.state_id == self.base.id)
            .collect())
    }
}

impl_entity!(State, "State");
