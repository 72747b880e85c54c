use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error};

use crate::io::recovery::{self, RecoveryEntry, RecoveryKind};
use crate::model::Catalog;

/// Error type for catalog persistence
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {target}: {source}")]
    Write {
        target: String,
        source: std::io::Error,
    },
    #[error("malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse a catalog document, defaulting every missing or `null` field.
pub fn parse_catalog(text: &str) -> Result<Catalog, PersistenceError> {
    if text.trim().is_empty() {
        return Ok(Catalog::default());
    }
    Ok(serde_json::from_str(text)?)
}

pub fn serialize_catalog(catalog: &Catalog) -> Result<String, PersistenceError> {
    let mut text = serde_json::to_string_pretty(catalog)?;
    text.push('\n');
    Ok(text)
}

/// Where the catalog document lives.
pub trait PersistenceAdapter {
    fn load(&mut self) -> Result<Catalog, PersistenceError>;
    fn save(&mut self, catalog: &Catalog) -> Result<(), PersistenceError>;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// The catalog as one pretty-printed JSON file, written atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    file_name: String,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        JsonFileStore {
            data_dir: data_dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl PersistenceAdapter for JsonFileStore {
    /// A missing file loads as an empty catalog.
    fn load(&mut self) -> Result<Catalog, PersistenceError> {
        let path = self.path();
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no catalog file, starting empty");
                return Ok(Catalog::default());
            }
            Err(e) => return Err(PersistenceError::Read { path, source: e }),
        };
        parse_catalog(&text)
    }

    /// On failure the unsaved document goes to the recovery log.
    fn save(&mut self, catalog: &Catalog) -> Result<(), PersistenceError> {
        let content = serialize_catalog(catalog)?;
        if let Err(e) = recovery::atomic_write(&self.path(), content.as_bytes()) {
            error!(file = %self.file_name, error = %e, "catalog write failed");
            recovery::log_recovery(
                &self.data_dir,
                RecoveryEntry::new(RecoveryKind::Unsaved, "catalog write failed")
                    .detail("Target", &self.file_name)
                    .detail("Error", &e)
                    .payload(content),
            );
            return Err(PersistenceError::Write {
                target: self.file_name.clone(),
                source: e,
            });
        }
        debug!(file = %self.file_name, "catalog saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    document: Option<String>,
    saves: usize,
    fail_saves: bool,
}

/// Keeps the serialized document in memory. Clones share state, so a test
/// can hold one handle while a session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_document(text: impl Into<String>) -> Self {
        let store = MemoryStore::default();
        store.inner.borrow_mut().document = Some(text.into());
        store
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }

    pub fn document(&self) -> Option<String> {
        self.inner.borrow().document.clone()
    }

    /// Make every following save fail with a write error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.borrow_mut().fail_saves = fail;
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&mut self) -> Result<Catalog, PersistenceError> {
        match &self.inner.borrow().document {
            Some(text) => parse_catalog(text),
            None => Ok(Catalog::default()),
        }
    }

    fn save(&mut self, catalog: &Catalog) -> Result<(), PersistenceError> {
        let content = serialize_catalog(catalog)?;
        let mut inner = self.inner.borrow_mut();
        if inner.fail_saves {
            return Err(PersistenceError::Write {
                target: "memory".to_string(),
                source: std::io::Error::other("simulated write failure"),
            });
        }
        inner.document = Some(content);
        inner.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Food, Tag};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.tags.push(Tag::new(1, "protein"));
        let mut tofu = Food::new(10, "Tofu");
        tofu.tag_ids.insert(1);
        tofu.nutrition.protein = Some(8.0);
        let mut cat = Category::new(2, "Soy");
        cat.foods.push(tofu);
        catalog.categories.push(cat);
        catalog.loose_foods.push(Food::new(11, "Salt"));
        catalog
    }

    #[test]
    fn file_store_saves_and_loads() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(tmp.path(), "data.json");
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(tmp.path(), "data.json");
        assert_eq!(store.load().unwrap(), Catalog::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("data.json"), "{ not json").unwrap();
        let mut store = JsonFileStore::new(tmp.path(), "data.json");
        assert!(matches!(store.load(), Err(PersistenceError::Malformed(_))));
    }

    #[test]
    fn failed_write_lands_in_recovery_log() {
        let tmp = TempDir::new().unwrap();
        // the target is a directory, so the rename fails
        std::fs::create_dir(tmp.path().join("data.json")).unwrap();
        let mut store = JsonFileStore::new(tmp.path(), "data.json");
        let err = store.save(&sample()).unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));

        let entries = recovery::read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, RecoveryKind::Unsaved);
        assert!(entries[0].payload.contains("\"Tofu\""));
    }

    #[test]
    fn legacy_document_loads_with_defaults() {
        let text = r#"{"foods":[{"id":1,"name":"Rice","tags":[3]}],"tags":null}"#;
        let catalog = parse_catalog(text).unwrap();
        assert!(catalog.tags.is_empty());
        assert!(catalog.categories.is_empty());
        assert_eq!(catalog.loose_foods[0].tag_ids.len(), 1);
        assert!(catalog.loose_foods[0].nutrition.is_empty());
    }

    #[test]
    fn memory_store_counts_and_fails_on_demand() {
        let handle = MemoryStore::new();
        let mut store = handle.clone();
        store.save(&sample()).unwrap();
        assert_eq!(handle.save_count(), 1);
        handle.set_fail_saves(true);
        assert!(store.save(&sample()).is_err());
        assert_eq!(handle.save_count(), 1);
        assert_eq!(store.load().unwrap(), sample());
    }
}
