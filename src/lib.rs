//! Minka - Backend-Agnostic Entity Persistence
//!
//! A lightweight persistence engine for a small set of domain entity types.
//! Entities live in an in-memory registry keyed by `"TypeName.id"` and are
//! made durable either as a single JSON document on disk or as rows in a
//! PostgreSQL table. Callers never see which backend is active.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Storage Trait                          │
//! │        all / register / save / reload / delete / close       │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                              ↑
//!          │                              │
//! ┌────────┴────────┐           ┌────────┴────────┐
//! │    FileStore    │           │  PostgresStore  │
//! │ (JSON document) │           │ (feature-gated) │
//! └─────────────────┘           └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use minka::{storage, StorageConfig, TypeRegistry, User};
//!
//! # async fn demo() -> minka::StorageResult<()> {
//! let registry = Arc::new(TypeRegistry::builtin());
//! let store = storage::open(&StorageConfig::from_env(), registry).await?;
//!
//! let mut user = User::new("betty@example.com", "secret");
//! user.first_name = "Betty".to_string();
//! store.persist(&mut user).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod model;
pub mod storage;

pub use model::{Amenity, BaseEntity, City, Entity, Place, Review, State, User, CLASS_KEY};
pub use storage::{
    BackendKind, EntityMap, FileStore, Storage, StorageConfig, StorageError, StorageResult,
    TypeRegistry,
};

#[cfg(feature = "postgres")]
pub use storage::PostgresStore;
