//! Small string-keyed store for user preferences and saved locations.
//!
//! Values are JSON text, so callers own their own (de)serialization.

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::PathBuf,
};

pub const SAVED_LOCATIONS_KEY: &str = "saved_locations";
pub const USE_CELSIUS_KEY: &str = "use_celsius";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// In-process store, nothing is persisted.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read store file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse store file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Open the store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::config::Config::store_file_path()?)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(entries)
            .context("Failed to serialize store contents")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    /// Nothing changes in memory unless the write to disk succeeds.
    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value);
        self.flush(&entries)?;
        self.entries = entries;
        Ok(())
    }
}
