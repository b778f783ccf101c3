//! The User entity.

use serde::{Deserialize, Serialize};

use crate::model::base::entity_from_map;
use crate::model::{impl_entity, BaseEntity, JsonMap, Place, Review};
use crate::storage::{all_of, Storage, StorageResult};

/// An account that owns places and writes reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identity and timestamps.
    #[serde(flatten)]
    pub base: BaseEntity,
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Password (stored as supplied; hashing is a schema concern).
    #[serde(default)]
    pub password: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Attributes from newer builds, preserved verbatim.
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl User {
    /// Fresh user with a new identity.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base: BaseEntity::new(),
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
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

    /// Places owned by this user.
    ///
    /// # Errors
    /// Propagates the store's read error.
    pub async fn places(&self, store: &dyn Storage) -> StorageResult<Vec<Place>> {
        let places = all_of::<Place>(store).await?;
        Ok(places
            .into_iter()
            .filter(|p| p.user_id == self.base.id)
            .collect())
    }

    /// Reviews written by this user.
    ///
    /// # Errors
    /// Propagates the store's read error.
    pub async fn reviews(&self, store: &dyn Storage) -> StorageResult<Vec<Review>> {
        let reviews = all_of::<Review>(store).await?;
        Ok(reviews
            .into_iter()
            .filter(|r| r.user_id == self.base.id)
            .collect())
    }
}

impl_entity!(User, "User");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;

    #[test]
    fn test_round_trip_preserves_all_attributes() {
        let mut user = User::new("betty@example.com", "secret");
        user.first_name = "Betty".to_string();
        user.last_name = "Holberton".to_string();

        let map = user.to_map().unwrap();
        let back = User::from_map(map).unwrap();

        assert_eq!(back, user);
        assert_eq!(back.base.id, user.base.id, "id must not be regenerated");
        assert_eq!(back.base.created_at, user.base.created_at);
        assert_eq!(back.base.updated_at, user.base.updated_at);
    }

    #[test]
    fn test_unknown_attributes_survive_reconstruction() {
        let mut map = User::new("a@b.c", "pw").to_map().unwrap();
        map.insert("loyalty_tier".to_string(), serde_json::json!("gold"));

        let user = User::from_map(map).unwrap();
        assert_eq!(
            user.extra.get("loyalty_tier"),
            Some(&serde_json::json!("gold"))
        );

        let again = user.to_map().unwrap();
        assert_eq!(again.get("loyalty_tier"), Some(&serde_json::json!("gold")));
    }

    #[test]
    fn test_serialized_form_carries_discriminator() {
        let map = User::new("a@b.c", "pw").to_map().unwrap();
        assert_eq!(map.get(crate::CLASS_KEY), Some(&serde_json::json!("User")));
    }

    #[test]
    fn test_render_is_deterministic() {
        let user = User::new("a@b.c", "pw");
        assert_eq!(user.render(), user.render());
        assert!(user.render().starts_with(&format!("[User] ({})", user.base.id)));
    }
}
