//! Durable client-side storage.
//!
//! Slices are written as `{ "version": 1, "items": [...] }` under a fixed key.
//! A missing, unreadable or foreign-version blob loads as an empty slice.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use crate::domain::aggregates::{Product, Wishlist, WishlistItem};
use crate::{Result, StorefrontError};

pub const CART_STORAGE_KEY: &str = "cart-storage";
pub const WISHLIST_STORAGE_KEY: &str = "wishlist-storage";
pub const SCHEMA_VERSION: u32 = 1;

pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One JSON file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore { dir: PathBuf }

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path { &self.dir }
    fn path(&self, key: &str) -> PathBuf { self.dir.join(format!("{}.json", key)) }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| storage_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| storage_error(&path, e))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != IoErrorKind::NotFound => Err(storage_error(&path, e)),
            _ => Ok(()),
        }
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> StorefrontError {
    StorefrontError::StorageError(format!("{}: {}", path.display(), e))
}

/// Process-local store, for tests and for callers with no durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore { entries: Mutex<HashMap<String, String>> }

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> { self.entries.lock().unwrap_or_else(PoisonError::into_inner) }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> { Ok(self.entries().get(key).cloned()) }
    fn write(&self, key: &str, value: &str) -> Result<()> { self.entries().insert(key.to_string(), value.to_string()); Ok(()) }
    fn remove(&self, key: &str) -> Result<()> { self.entries().remove(key); Ok(()) }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> { version: u32, items: &'a [T] }

#[derive(Deserialize)]
struct Envelope<T> { version: u32, items: Vec<T> }

pub fn save_items<S, T>(store: &S, key: &str, items: &[T]) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let blob = serde_json::to_string(&EnvelopeRef { version: SCHEMA_VERSION, items })?;
    store.write(key, &blob)
}

pub fn load_items<S, T>(store: &S, key: &str) -> Vec<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let blob = match store.read(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read persisted slice, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Envelope<T>>(&blob) {
        Ok(envelope) if envelope.version == SCHEMA_VERSION => envelope.items,
        Ok(envelope) => {
            tracing::warn!(key, version = envelope.version, expected = SCHEMA_VERSION, "persisted slice has another schema version, discarding");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "persisted slice is corrupt, discarding");
            Vec::new()
        }
    }
}

/// Wishlist bound to its storage key; every change is written through.
pub struct PersistentWishlist<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    wishlist: Wishlist,
}

impl<S: KeyValueStore + ?Sized> PersistentWishlist<S> {
    pub fn load(store: Arc<S>) -> Self {
        let wishlist = Wishlist::from_items(load_items::<S, WishlistItem>(&*store, WISHLIST_STORAGE_KEY));
        Self { store, wishlist }
    }

    pub fn wishlist(&self) -> &Wishlist { &self.wishlist }

    pub fn toggle(&mut self, product: &Product) -> bool {
        let saved = self.wishlist.toggle(product);
        self.persist();
        saved
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        let removed = self.wishlist.remove(product_id);
        if removed { self.persist(); }
        removed
    }

    pub fn clear(&mut self) {
        self.wishlist.clear();
        if let Err(e) = self.store.remove(WISHLIST_STORAGE_KEY) {
            tracing::warn!(error = %e, "failed to clear persisted wishlist");
        }
    }

    fn persist(&self) {
        if let Err(e) = save_items(&*self.store, WISHLIST_STORAGE_KEY, self.wishlist.items()) {
            tracing::warn!(error = %e, "failed to persist wishlist");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Naira;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row { id: u32 }

    #[test]
    fn test_round_trip_preserves_order() {
        let store = MemoryStore::new();
        save_items(&store, "rows", &[Row { id: 3 }, Row { id: 1 }, Row { id: 2 }]).unwrap();
        let rows: Vec<Row> = load_items(&store, "rows");
        assert_eq!(rows, vec![Row { id: 3 }, Row { id: 1 }, Row { id: 2 }]);
    }

    #[test]
    fn test_corrupt_or_foreign_blob_loads_empty() {
        let store = MemoryStore::new();
        store.write("rows", "{not json").unwrap();
        assert!(load_items::<_, Row>(&store, "rows").is_empty());
        store.write("rows", r#"{"version":99,"items":[{"id":1}]}"#).unwrap();
        assert!(load_items::<_, Row>(&store, "rows").is_empty());
        store.write("rows", r#"{"items":[{"id":1}]}"#).unwrap();
        assert!(load_items::<_, Row>(&store, "rows").is_empty());
        assert!(load_items::<_, Row>(&store, "absent").is_empty());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested")).unwrap();
        assert_eq!(store.read("k").unwrap(), None);
        store.write("k", "v1").unwrap();
        store.write("k", "v2").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v2"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
    }

    #[test]
    fn test_persistent_wishlist_survives_reload() {
        let store = Arc::new(MemoryStore::new());
        let p = Product::create("loose-deep", "Loose Deep Wave", Naira::new(85_000));
        let mut list = PersistentWishlist::load(Arc::clone(&store));
        assert!(list.toggle(&p));
        let reloaded = PersistentWishlist::load(Arc::clone(&store));
        assert!(reloaded.wishlist().contains("loose-deep"));
        list.clear();
        assert!(PersistentWishlist::load(store).wishlist().is_empty());
    }
}
