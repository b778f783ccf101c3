//! End-to-end exercises of the storage contract through the facade.
//!
//! Everything here talks to `Arc<dyn Storage>` the way application code
//! does, so the assertions hold for whichever backend `open` returns.

use std::sync::Arc;

use minka::storage::{self, all_of};
use minka::{
    Amenity, City, Entity, Place, Review, State, Storage, StorageConfig, TypeRegistry, User,
};
use tempfile::tempdir;

fn init() {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();
}

async fn open_file_store(dir: &tempfile::TempDir) -> Arc<dyn Storage> {
    let config = StorageConfig::file(dir.path().join("file.json"));
    storage::open(&config, Arc::new(TypeRegistry::builtin()))
        .await
        .expect("file store should open on an empty directory")
}

#[tokio::test]
async fn test_full_unit_of_work() -> anyhow::Result<()> {
    init();
    let dir = tempdir()?;
    let store = open_file_store(&dir).await;

    // Build a small world.
    let mut oregon = State::new("Oregon");
    store.persist(&mut oregon).await?;

    let mut portland = City::new("Portland", oregon.base.id.as_str());
    store.persist(&mut portland).await?;

    let mut betty = User::new("betty@example.com", "pw");
    store.persist(&mut betty).await?;

    let mut wifi = Amenity::new("wifi");
    store.persist(&mut wifi).await?;

    let mut cabin = Place::new(portland.base.id.as_str(), betty.base.id.as_str(), "Cabin");
    cabin.price_by_night = 95;
    cabin.add_amenity(&wifi);
    store.persist(&mut cabin).await?;

    let mut review = Review::new("lovely stay", cabin.base.id.as_str(), betty.base.id.as_str());
    store.persist(&mut review).await?;

    // A fresh store over the same document sees the same world.
    let config = StorageConfig::file(dir.path().join("file.json"));
    let fresh = storage::open(&config, Arc::new(TypeRegistry::builtin())).await?;

    let all = fresh.all(None).await?;
    assert_eq!(all.len(), 6);

    // Read-through relationship queries.
    let cities = oregon.cities(fresh.as_ref()).await?;
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].name, "Portland");

    let places = cities[0].places(fresh.as_ref()).await?;
    assert_eq!(places.len(), 1);
    assert_eq!(places[0].price_by_night, 95);

    let amenities = places[0].amenities(fresh.as_ref()).await?;
    assert_eq!(amenities.len(), 1);
    assert_eq!(amenities[0].name, "wifi");

    let reviews = places[0].reviews(fresh.as_ref()).await?;
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].text, "lovely stay");

    let owned = betty.places(fresh.as_ref()).await?;
    assert_eq!(owned.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_filtered_query_partitions_types() -> anyhow::Result<()> {
    init();
    let dir = tempdir()?;
    let store = open_file_store(&dir).await;

    store.register(Box::new(State::new("Oregon"))).await?;
    store.register(Box::new(State::new("Nevada"))).await?;
    store.register(Box::new(Amenity::new("wifi"))).await?;

    let states = store.all(Some("State")).await?;
    assert_eq!(states.len(), 2);
    assert!(states.values().all(|e| e.type_name() == "State"));

    let amenities = store.all(Some("Amenity")).await?;
    assert_eq!(amenities.len(), 1);

    let unknown = store.all(Some("Spaceship")).await?;
    assert!(unknown.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_then_save_removes_durably() -> anyhow::Result<()> {
    init();
    let dir = tempdir()?;
    let store = open_file_store(&dir).await;

    let mut state = State::new("Oregon");
    store.persist(&mut state).await?;
    store.delete(Some(&state)).await?;
    store.save().await?;

    let config = StorageConfig::file(dir.path().join("file.json"));
    let fresh = storage::open(&config, Arc::new(TypeRegistry::builtin())).await?;
    assert!(fresh.all(None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_identity_uniqueness_across_instances() -> anyhow::Result<()> {
    init();
    let dir = tempdir()?;
    let store = open_file_store(&dir).await;

    // Two logical versions of the same entity: one registry entry.
    let mut user = User::new("a@b.c", "pw");
    store.persist(&mut user).await?;
    user.first_name = "Betty".to_string();
    store.persist(&mut user).await?;

    let users = all_of::<User>(store.as_ref()).await?;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].first_name, "Betty");

    Ok(())
}

#[tokio::test]
async fn test_backend_selection_from_env() -> anyhow::Result<()> {
    init();

    // All environment assertions live in one test: the variables are
    // process-global and tests run concurrently.
    std::env::remove_var(minka::storage::STORAGE_ENV);
    let config = StorageConfig::from_env();
    assert_eq!(config.backend, minka::BackendKind::File);
    assert_eq!(
        config.file_path,
        std::path::PathBuf::from(minka::storage::FILE_PATH_DEFAULT)
    );

    std::env::set_var(minka::storage::STORAGE_ENV, "db");
    assert_eq!(StorageConfig::from_env().backend, minka::BackendKind::Database);

    std::env::set_var(minka::storage::STORAGE_ENV, "cassette-tape");
    assert_eq!(
        StorageConfig::from_env().backend,
        minka::BackendKind::File,
        "unrecognized values default to the file engine"
    );

    std::env::remove_var(minka::storage::STORAGE_ENV);
    Ok(())
}

#[tokio::test]
async fn test_updated_at_moves_created_at_does_not() -> anyhow::Result<()> {
    init();
    let dir = tempdir()?;
    let store = open_file_store(&dir).await;

    let mut state = State::new("Oregon");
    let created = state.base.created_at;
    let first_update = state.base.updated_at;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.persist(&mut state).await?;

    assert_eq!(state.base.created_at, created);
    assert!(state.base.updated_at > first_update);

    Ok(())
}
