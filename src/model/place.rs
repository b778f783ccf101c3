//! The Place entity.

use serde::{Deserialize, Serialize};

use crate::model::base::entity_from_map;
use crate::model::{impl_entity, Amenity, BaseEntity, JsonMap, Review};
use crate::storage::{all_of, Storage, StorageResult};

/// A rentable property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Identity and timestamps.
    #[serde(flatten)]
    pub base: BaseEntity,
    /// Owning [`City`](crate::model::City) id.
    #[serde(default)]
    pub city_id: String,
    /// Owning [`User`](crate::model::User) id.
    #[serde(default)]
    pub user_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Room count.
    #[serde(default)]
    pub number_rooms: i64,
    /// Bathroom count.
    #[serde(default)]
    pub number_bathrooms: i64,
    /// Guest capacity.
    #[serde(default)]
    pub max_guest: i64,
    /// Nightly price.
    #[serde(default)]
    pub price_by_night: i64,
    /// Latitude, if geolocated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude, if geolocated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Linked amenity ids.
    ///
    /// Deliberately per-instance state: each place owns its own list, so
    /// linking an amenity to one place never leaks into another.
    #[serde(default)]
    pub amenity_ids: Vec<String>,
    /// Attributes from newer builds, preserved verbatim.
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Place {
    /// Fresh place with a new identity.
    #[must_use]
    pub fn new(
        city_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseEntity::new(),
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: String::new(),
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
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

    /// Link an amenity to this place. Linking twice is a no-op.
    pub fn add_amenity(&mut self, amenity: &Amenity) {
        if !self.amenity_ids.contains(&amenity.base.id) {
            self.amenity_ids.push(amenity.base.id.clone());
        }
    }

    /// Reviews of this place.
    ///
    /// # Errors
    /// Propagates the store's read error.
    pub async fn reviews(&self, store: &dyn Storage) -> StorageResult<Vec<Review>> {
        let reviews = all_of::<Review>(store).await?;
        Ok(reviews
            .into_iter()
            .filter(|r| r.place_id == self.base.id)
            .collect())
    }

    /// Amenities linked to this place.
    ///
    /// # Errors
    /// Propagates the store's read error.
    pub async fn amenities(&self, store: &dyn Storage) -> StorageResult<Vec<Amenity>> {
        let amenities = all_of::<Amenity>(store).await?;
        Ok(amenities
            .into_iter()
            .filter(|a| self.amenity_ids.contains(&a.base.id))
            .collect())
    }
}

impl_entity!(Place, "Place");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;

    #[test]
    fn test_amenity_links_are_per_instance() {
        let wifi = Amenity::new("wifi");
        let mut cabin = Place::new("city-1", "user-1", "Cabin");
        let loft = Place::new("city-1", "user-1", "Loft");

        cabin.add_amenity(&wifi);

        assert_eq!(cabin.amenity_ids, vec![wifi.base.id.clone()]);
        assert!(loft.amenity_ids.is_empty(), "no shared amenity list");
    }

    #[test]
    fn test_add_amenity_twice_links_once() {
        let wifi = Amenity::new("wifi");
        let mut cabin = Place::new("city-1", "user-1", "Cabin");

        cabin.add_amenity(&wifi);
        cabin.add_amenity(&wifi);

        assert_eq!(cabin.amenity_ids.len(), 1);
    }

    #[test]
    fn test_round_trip_keeps_numbers_and_links() {
        let mut place = Place::new("city-1", "user-1", "Cabin");
        place.number_rooms = 3;
        place.price_by_night = 120;
        place.latitude = Some(37.77);
        place.amenity_ids = vec!["a-1".to_string(), "a-2".to_string()];

        let back = Place::from_map(place.to_map().unwrap()).unwrap();
        assert_eq!(back, place);
    }
}
