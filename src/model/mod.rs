//! Domain entity types and the contract they share.
//!
//! Each type is a plain struct with a flattened [`BaseEntity`] for
//! identity and timestamps, a flattened `extra` map that preserves
//! attributes this build does not know about, and read-through helpers
//! for its relationships (a linear scan over `all(type)` — the
//! relational backend answers the same question with an indexed query,
//! which is an acceptable asymptotic difference, not a contract one).

pub mod base;

mod amenity;
mod city;
mod place;
mod review;
mod state;
mod user;

pub use amenity::Amenity;
pub use base::{BaseEntity, Entity, JsonMap, TypeNamed, CLASS_KEY, TIMESTAMP_FORMAT};
pub use city::City;
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;

pub(crate) use base::impl_entity;
