// Wallmix - Collection store
// Named, user-curated groups of wallpapers. The whole set lives as one JSON
// blob under a single key: read once on first access, rewritten in full on
// every mutation. A missing or unreadable blob means "no collections yet".

use std::sync::Arc;

use chrono::Utc;

use crate::constants::COLLECTIONS_KEY;
use crate::error::{Result, WallmixError};
use crate::models::{Collection, WallpaperRecord};
use crate::storage::KeyValueStore;

pub struct CollectionStore {
    store: Arc<dyn KeyValueStore>,
    cache: Option<Vec<Collection>>,
}

impl CollectionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, cache: None }
    }

    /// All collections, loading from storage on first access.
    pub fn list(&mut self) -> Result<&[Collection]> {
        if self.cache.is_none() {
            self.cache = Some(self.load()?);
        }
        Ok(self.cache.as_deref().unwrap_or(&[]))
    }

    /// Drop the cache and re-read storage.
    pub fn reload(&mut self) -> Result<&[Collection]> {
        self.cache = None;
        self.list()
    }

    pub fn get(&mut self, id: &str) -> Result<Collection> {
        self.list()?
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| WallmixError::CollectionNotFound(id.to_string()))
    }

    pub fn create(&mut self, name: &str) -> Result<Collection> {
        let name = validate_name(name)?;
        let mut collections = self.list()?.to_vec();

        let collection = Collection {
            id: next_id(&collections),
            name,
            wallpapers: Vec::new(),
            created: Utc::now(),
        };
        collections.push(collection.clone());
        self.persist(collections)?;

        log::info!("Created collection '{}' ({})", collection.name, collection.id);
        Ok(collection)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<Collection> {
        let name = validate_name(name)?;
        self.update(id, |collection| {
            collection.name = name;
            Ok(())
        })
    }

    /// Merge wallpapers into a collection; a re-added id replaces the stored copy.
    pub fn add_wallpapers(
        &mut self,
        id: &str,
        wallpapers: Vec<WallpaperRecord>,
    ) -> Result<Collection> {
        let incoming = wallpapers.len();
        let updated = self.update(id, |collection| {
            let added = collection.merge_wallpapers(wallpapers);
            log::info!(
                "Collection {}: {} new, {} replaced",
                collection.id,
                added,
                incoming - added
            );
            Ok(())
        })?;
        Ok(updated)
    }

    pub fn remove_wallpaper(&mut self, id: &str, wallpaper_id: &str) -> Result<Collection> {
        self.update(id, |collection| {
            let before = collection.wallpapers.len();
            collection.wallpapers.retain(|w| w.id != wallpaper_id);
            if collection.wallpapers.len() == before {
                return Err(WallmixError::WallpaperNotFound(wallpaper_id.to_string()));
            }
            Ok(())
        })
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let mut collections = self.list()?.to_vec();
        let index = collections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| WallmixError::CollectionNotFound(id.to_string()))?;

        let removed = collections.remove(index);
        self.persist(collections)?;
        log::info!("Deleted collection '{}' ({})", removed.name, removed.id);
        Ok(())
    }

    /// Look up, apply `f` to a copy, persist, then commit to the cache.
    /// Nothing changes if the lookup, `f`, or the write fails.
    fn update<F>(&mut self, id: &str, f: F) -> Result<Collection>
    where
        F: FnOnce(&mut Collection) -> Result<()>,
    {
        let mut collections = self.list()?.to_vec();
        let collection = collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| WallmixError::CollectionNotFound(id.to_string()))?;

        f(collection)?;
        let updated = collection.clone();
        self.persist(collections)?;
        Ok(updated)
    }

    fn persist(&mut self, collections: Vec<Collection>) -> Result<()> {
        let blob = serde_json::to_string(&collections)?;
        self.store.set(COLLECTIONS_KEY, &blob)?;
        self.cache = Some(collections);
        Ok(())
    }

    fn load(&self) -> Result<Vec<Collection>> {
        let Some(blob) = self.store.get(COLLECTIONS_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Collection>>(&blob) {
            Ok(collections) => {
                log::debug!("Loaded {} collections", collections.len());
                Ok(collections)
            }
            Err(e) => {
                log::warn!("Stored collections are unreadable, starting empty: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WallmixError::InvalidInput("collection name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Creation time in milliseconds, bumped past any id already taken.
fn next_id(existing: &[Collection]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while existing.iter().any(|c| c.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;
    use crate::storage::{MemoryStore, SqliteStore};

    fn wallpaper(id: &str, title: &str) -> WallpaperRecord {
        WallpaperRecord::new(
            Provider::Wallhaven,
            id,
            title,
            "thumb",
            format!("https://full/{}", id),
            "1920x1080",
        )
    }

    fn memory() -> (Arc<MemoryStore>, CollectionStore) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), CollectionStore::new(store))
    }

    #[test]
    fn test_create_then_list() {
        let (_, mut collections) = memory();
        collections.create("Favorites").unwrap();

        let list = collections.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Favorites");
        assert!(list[0].wallpapers.is_empty());
        assert!(!list[0].id.is_empty());
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let (_, mut collections) = memory();
        let a = collections.create("A").unwrap();
        let b = collections.create("B").unwrap();
        let c = collections.create("C").unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_blank_name_rejected() {
        let (store, mut collections) = memory();
        assert!(matches!(collections.create("   "), Err(WallmixError::InvalidInput(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_add_is_idempotent_by_id_and_later_wins() {
        let (_, mut collections) = memory();
        let c = collections.create("Favorites").unwrap();

        collections.add_wallpapers(&c.id, vec![wallpaper("a", "first")]).unwrap();
        collections.add_wallpapers(&c.id, vec![wallpaper("a", "first")]).unwrap();
        let updated = collections.add_wallpapers(&c.id, vec![wallpaper("a", "second")]).unwrap();

        assert_eq!(updated.wallpapers.len(), 1);
        assert_eq!(updated.wallpapers[0].title, "second");
    }

    #[test]
    fn test_add_dedups_within_one_call() {
        let (_, mut collections) = memory();
        let c = collections.create("Mix").unwrap();
        let updated = collections
            .add_wallpapers(
                &c.id,
                vec![wallpaper("a", "1"), wallpaper("b", "2"), wallpaper("a", "3")],
            )
            .unwrap();

        let ids: Vec<&str> = updated.wallpapers.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(updated.wallpapers[0].title, "3");
    }

    #[test]
    fn test_add_to_missing_collection() {
        let (_, mut collections) = memory();
        let err = collections.add_wallpapers("nope", vec![wallpaper("a", "1")]).unwrap_err();
        assert!(matches!(err, WallmixError::CollectionNotFound(_)));
    }

    #[test]
    fn test_delete_missing_leaves_storage_untouched() {
        let (store, mut collections) = memory();
        collections.create("Keep").unwrap();
        let before = store.get(COLLECTIONS_KEY).unwrap();
        let writes = store.write_count();

        let err = collections.delete("missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.get(COLLECTIONS_KEY).unwrap(), before);
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_delete_removes_and_persists() {
        let (store, mut collections) = memory();
        let a = collections.create("A").unwrap();
        collections.create("B").unwrap();
        collections.delete(&a.id).unwrap();

        let mut fresh = CollectionStore::new(store);
        let names: Vec<String> = fresh.list().unwrap().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn test_rename_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("wallmix.db");

        let id = {
            let store = SqliteStore::open(&db_path).unwrap();
            let mut collections = CollectionStore::new(Arc::new(store));
            let c = collections.create("Old Name").unwrap();
            collections.rename(&c.id, "New Name").unwrap();
            c.id
        };

        let mut reloaded = CollectionStore::new(Arc::new(SqliteStore::open(&db_path).unwrap()));
        assert_eq!(reloaded.get(&id).unwrap().name, "New Name");
    }

    #[test]
    fn test_rename_missing() {
        let (_, mut collections) = memory();
        assert!(matches!(
            collections.rename("ghost", "x"),
            Err(WallmixError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn test_remove_wallpaper() {
        let (_, mut collections) = memory();
        let c = collections.create("Mix").unwrap();
        collections.add_wallpapers(&c.id, vec![wallpaper("a", "1"), wallpaper("b", "2")]).unwrap();

        let updated = collections.remove_wallpaper(&c.id, "a").unwrap();
        assert_eq!(updated.wallpapers.len(), 1);

        let err = collections.remove_wallpaper(&c.id, "a").unwrap_err();
        assert!(matches!(err, WallmixError::WallpaperNotFound(_)));
        assert_eq!(collections.get(&c.id).unwrap().wallpapers.len(), 1);
    }

    #[test]
    fn test_corrupt_blob_is_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(COLLECTIONS_KEY, "{not json").unwrap();
        let mut collections = CollectionStore::new(store);
        assert!(collections.list().unwrap().is_empty());
    }

    #[test]
    fn test_blob_without_wallpapers_field() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                COLLECTIONS_KEY,
                r#"[{"id":"1700000000000","name":"Old","created":"2024-01-01T00:00:00Z"}]"#,
            )
            .unwrap();
        let mut collections = CollectionStore::new(store);
        let list = collections.list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].wallpapers.is_empty());
    }
}
