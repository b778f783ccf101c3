//! The Review entity.

use serde::{Deserialize, Serialize};

use crate::model::base::entity_from_map;
use crate::model::{impl_entity, BaseEntity, JsonMap};
use crate::storage::StorageResult;

/// A user's review of a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Identity and timestamps.
    #[serde(flatten)]
    pub base: BaseEntity,
    /// Review body.
    #[serde(default)]
    pub text: String,
    /// Reviewed [`Place`](crate::model::Place) id.
    #[serde(default)]
    pub place_id: String,
    /// Authoring [`User`](crate::model::User) id.
    #[serde(default)]
    pub user_id: String,
    /// Attributes from newer builds, preserved verbatim.
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Review {
    /// Fresh review with a new identity.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        place_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseEntity::new(),
            text: text.into(),
            place_id: place_id.into(),
            user_id: user_id.into(),
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

impl_entity!(Review, "Review");
