//! Entity contract: identity, timestamps, map serialization.
//!
//! Every storable type embeds a [`BaseEntity`] (flattened into its
//! serialized form) and implements the [`Entity`] trait through a small
//! crate-internal macro. The serialized form is a flat
//! JSON object of attribute name to primitive value, plus the reserved
//! `__class__` key carrying the type discriminator.
//!
//! # Round-trip guarantee
//!
//! `from_map(to_map(x))` reconstructs an entity equal to `x` in every
//! observable attribute. Supplied `id` and timestamps are authoritative
//! on reconstruction — they are never regenerated. Unknown keys survive
//! the trip untouched (forward-compatible).

use std::any::Any;
use std::fmt;

use chrono::{NaiveDateTime, Timelike, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::storage::StorageResult;

/// Flat attribute map — the serialized form of an entity.
pub type JsonMap = serde_json::Map<String, Value>;

/// Reserved key carrying the type discriminator in serialized form.
pub const CLASS_KEY: &str = "__class__";

/// Timestamp render format: ISO-8601, microsecond precision, no zone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current time in the engine's naive-timestamp convention.
///
/// Truncated to microseconds, the precision of the durable form, so a
/// freshly stamped entity compares equal after a document round trip.
#[must_use]
pub fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Parse a serialized timestamp, with or without a fractional part.
///
/// # Errors
/// Returns the underlying `chrono` error if the text matches neither form.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
}

/// Serde adapter rendering timestamps as ISO-8601 text.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{parse_timestamp, TIMESTAMP_FORMAT};

    /// Render as `%Y-%m-%dT%H:%M:%S%.6f`.
    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Parse from ISO-8601 text.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// BaseEntity
// =============================================================================

/// Identity and timestamps shared by every storable type.
///
/// Flattened into each entity's serialized form, so the durable document
/// sees `id`, `created_at`, `updated_at` as plain top-level attributes.
/// Missing keys on reconstruction fall back to fresh values, matching the
/// permissive construction contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEntity {
    /// Globally-unique identifier, immutable after construction.
    #[serde(default = "fresh_id")]
    pub id: String,
    /// Set once at construction.
    #[serde(with = "timestamp", default = "now")]
    pub created_at: NaiveDateTime,
    /// Refreshed by [`Entity::touch`] on every durable persist.
    #[serde(with = "timestamp", default = "now")]
    pub updated_at: NaiveDateTime,
}

impl BaseEntity {
    /// Fresh identity: random UUID, both timestamps set to now.
    #[must_use]
    pub fn new() -> Self {
        let created = now();
        Self {
            id: fresh_id(),
            created_at: created,
            updated_at: created,
        }
    }
}

impl Default for BaseEntity {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Entity trait
// =============================================================================

/// The contract every storable type satisfies.
///
/// Object-safe so the store can hold a heterogeneous registry of
/// `Box<dyn Entity>` without compile-time knowledge of every type.
pub trait Entity: fmt::Debug + Send + Sync {
    /// Type discriminator, used in registry keys and serialized form.
    fn type_name(&self) -> &'static str;

    /// Identity and timestamps.
    fn base(&self) -> &BaseEntity;

    /// Mutable identity and timestamps.
    fn base_mut(&mut self) -> &mut BaseEntity;

    /// Serialize to the flat attribute map, `__class__` included.
    ///
    /// # Errors
    /// Returns a serialization error if an attribute cannot be rendered.
    fn to_map(&self) -> StorageResult<JsonMap>;

    /// Clone behind the trait object.
    fn boxed_clone(&self) -> Box<dyn Entity>;

    /// Downcast support for typed read-back.
    fn as_any(&self) -> &dyn Any;

    /// Unique identifier.
    fn id(&self) -> &str {
        &self.base().id
    }

    /// Composite registry key, `"TypeName.id"`.
    fn key(&self) -> String {
        format!("{}.{}", self.type_name(), self.id())
    }

    /// Refresh `updated_at` to the current time.
    fn touch(&mut self) {
        self.base_mut().updated_at = now();
    }

    /// Deterministic diagnostic rendering: `[Type] (id) {attributes}`.
    ///
    /// Attribute order is sorted by key. Diagnostics only — not part of
    /// the durable contract.
    fn render(&self) -> String {
        match self.to_map() {
            Ok(map) => format!("[{}] ({}) {}", self.type_name(), self.id(), Value::Object(map)),
            Err(_) => format!("[{}] ({})", self.type_name(), self.id()),
        }
    }
}

impl Clone for Box<dyn Entity> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Serialize an entity struct to its flat map and stamp the discriminator.
pub(crate) fn entity_to_map<T: Serialize>(
    entity: &T,
    type_name: &'static str,
) -> StorageResult<JsonMap> {
    let value = serde_json::to_value(entity)?;
    let Value::Object(mut map) = value else {
        unreachable!("entity structs serialize to JSON objects");
    };
    map.insert(CLASS_KEY.to_string(), Value::String(type_name.to_string()));
    Ok(map)
}

/// Reconstruct an entity struct from its flat map.
///
/// The `__class__` key is stripped before deserialization; every other
/// key is applied, unknown keys landing in the type's `extra` map.
pub(crate) fn entity_from_map<T: DeserializeOwned>(mut map: JsonMap) -> StorageResult<T> {
    map.remove(CLASS_KEY);
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Implement [`Entity`] (and the typed-query hook) for a concrete type.
///
/// The type must be a struct with a `base: BaseEntity` field, `Clone`,
/// `Serialize`, and `Deserialize`.
macro_rules! impl_entity {
    ($ty:ty, $name:literal) => {
        impl $crate::model::Entity for $ty {
            fn type_name(&self) -> &'static str {
                $name
            }

            fn base(&self) -> &$crate::model::BaseEntity {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::model::BaseEntity {
                &mut self.base
            }

            fn to_map(&self) -> $crate::storage::StorageResult<$crate::model::JsonMap> {
                $crate::model::base::entity_to_map(self, $name)
            }

            fn boxed_clone(&self) -> Box<dyn $crate::model::Entity> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        impl $crate::model::TypeNamed for $ty {
            const NAME: &'static str = $name;
        }
    };
}

pub(crate) use impl_entity;

/// Compile-time type-name hook for typed queries ([`crate::storage::all_of`]).
pub trait TypeNamed {
    /// The discriminator this type registers under.
    const NAME: &'static str;
}

// =============================================================================
// Tests
// =============================================================================
