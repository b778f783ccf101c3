//! PostgresStore - the relational storage engine.
//!
//! Interface-equivalent alternate backend: entities map to rows in one
//! `entities` table, the serialized map (discriminator included) lands
//! in a JSONB column. A working set in memory mirrors the file engine
//! so `all`/`register`/`delete` behave identically; `register` stages,
//! `save` commits the unit of work in one transaction, `close` ends it
//! by re-reading the durable rows.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS entities (
//!     key TEXT PRIMARY KEY,
//!     entity_type TEXT NOT NULL,
//!     id TEXT NOT NULL,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMP NOT NULL,
//!     updated_at TIMESTAMP NOT NULL
//! );
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tokio::sync::RwLock;

use crate::model::Entity;
use crate::storage::backend::{EntityMap, Storage};
use crate::storage::registry::TypeRegistry;
use crate::storage::{StorageError, StorageResult};

/// One staged unit of work: live entities plus deletions awaiting commit.
#[derive(Default)]
struct WorkingSet {
    objects: HashMap<String, Box<dyn Entity>>,
    staged_deletes: HashSet<String>,
}

/// Relational storage engine over a PostgreSQL session.
///
/// Sessions are per-unit-of-work; do not share one store across
/// concurrent units without external synchronization.
pub struct PostgresStore {
    pool: PgPool,
    registry: Arc<TypeRegistry>,
    state: RwLock<WorkingSet>,
}

impl PostgresStore {
    /// Connect, initialize the schema, and load the current rows.
    ///
    /// # Errors
    /// Fails if no session can be established or the rows cannot be
    /// reconstructed through the registry.
    pub async fn open(url: &str, registry: Arc<TypeRegistry>) -> StorageResult<Self> {
        // Preconditions
        assert!(!url.is_empty(), "connection URL cannot be empty");
        assert!(
            url.starts_with("postgres://") || url.starts_with("postgresql://"),
            "connection URL must be a postgres URL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| StorageError::connection(format!("failed to connect: {e}")))?;

        let store = Self {
            pool,
            registry,
            state: RwLock::new(WorkingSet::default()),
        };
        store.init_schema().await?;
        store.reload().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                key TEXT PRIMARY KEY,
                entity_type TEXT NOT NULL,
                id TEXT NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(entity_type);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database(format!("failed to create schema: {e}")))?;

        Ok(())
    }

    /// Close all connections in the pool.
    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}

/// Reconstruct one row through the registry.
fn row_to_entity(row: &PgRow, registry: &TypeRegistry) -> StorageResult<Box<dyn Entity>> {
    let key: String = row
        .try_get("key")
        .map_err(|e| StorageError::database(e.to_string()))?;
    let type_name: String = row
        .try_get("entity_type")
        .map_err(|e| StorageError::database(e.to_string()))?;
    let data: Value = row
        .try_get("data")
        .map_err(|e| StorageError::database(e.to_string()))?;

    let Value::Object(map) = data else {
        return Err(StorageError::load(format!("row {key} holds non-object data")));
    };

    let factory = registry.resolve(&type_name).map_err(|_| {
        StorageError::load(format!("row {key}: unknown entity type {type_name}"))
    })?;

    factory(map)
}

#[async_trait]
impl Storage for PostgresStore {
    async fn all(&self, type_name: Option<&str>) -> StorageResult<EntityMap> {
        let state = self.state.read().await;
        let snapshot = state
            .objects
            .iter()
            .filter(|(_, entity)| type_name.map_or(true, |name| entity.type_name() == name))
            .map(|(key, entity)| (key.clone(), entity.boxed_clone()))
            .collect();
        Ok(snapshot)
    }

    async fn register(&self, entity: Box<dyn Entity>) -> StorageResult<()> {
        // Precondition
        assert!(!entity.id().is_empty(), "entity must have an id");

        let key = entity.key();
        let mut state = self.state.write().await;
        state.staged_deletes.remove(&key);
        state.objects.insert(key, entity);
        Ok(())
    }

    async fn save(&self) -> StorageResult<()> {
        // Snapshot the unit of work under the lock.
        let (rows, deletes) = {
            let state = self.state.read().await;
            let mut rows: Vec<(String, &'static str, String, Value, NaiveDateTime, NaiveDateTime)> =
                Vec::with_capacity(state.objects.len());
            for (key, entity) in &state.objects {
                rows.push((
                    key.clone(),
                    entity.type_name(),
                    entity.id().to_string(),
                    Value::Object(entity.to_map()?),
                    entity.base().created_at,
                    entity.base().updated_at,
                ));
            }
            let deletes: Vec<String> = state.staged_deletes.iter().cloned().collect();
            (rows, deletes)
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::database(format!("failed to begin transaction: {e}")))?;

        for (key, type_name, id, data, created_at, updated_at) in rows {
            sqlx::query(
                r#"
                INSERT INTO entities (key, entity_type, id, data, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (key) DO UPDATE SET
                    entity_type = EXCLUDED.entity_type,
                    id = EXCLUDED.id,
                    data = EXCLUDED.data,
                    created_at = EXCLUDED.created_at,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(&key)
            .bind(type_name)
            .bind(&id)
            .bind(&data)
            .bind(created_at)
            .bind(updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::database(format!("failed to store {key}: {e}")))?;
        }

        for key in &deletes {
            sqlx::query("DELETE FROM entities WHERE key = $1")
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::database(format!("failed to delete {key}: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::database(format!("failed to commit: {e}")))?;

        self.state.write().await.staged_deletes.clear();

        tracing::debug!("committed unit of work");
        Ok(())
    }

    async fn reload(&self) -> StorageResult<()> {
        let rows = sqlx::query("SELECT key, entity_type, data FROM entities")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::database(format!("failed to read entities: {e}")))?;

        let mut next: HashMap<String, Box<dyn Entity>> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let entity = row_to_entity(row, &self.registry)?;
            next.insert(entity.key(), entity);
        }

        let count = next.len();
        // Replace, never merge.
        let mut state = self.state.write().await;
        state.objects = next;
        state.staged_deletes.clear();

        tracing::debug!(entities = count, "reloaded entities from database");
        Ok(())
    }

    async fn delete(&self, entity: Option<&dyn Entity>) -> StorageResult<()> {
        if let Some(entity) = entity {
            let key = entity.key();
            let mut state = self.state.write().await;
            if state.objects.remove(&key).is_some() {
                state.staged_deletes.insert(key);
            }
        }
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.reload().await
    }
}

// =============================================================================
// Tests (require running Postgres)
// =============================================================================
