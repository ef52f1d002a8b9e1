//! Local key-value persistence and the selection store built on it

use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::MergedChannel;

/// Storage key of the persisted selection
pub const CHANNELS_STORAGE_KEY: &str = "@owntv_selected_channels";

/// Minimal string key-value storage
pub trait KeyValueStore {
    /// `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One JSON file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .filter_map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => Some(c),
                '@' => None,
                _ => Some('_'),
            })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write to a sibling file first so a crash never leaves half a blob
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    values: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persists the ordered selection as a single JSON array
pub struct SelectionStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SelectionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Saved selection, or `None` if nothing was saved or it could not be read
    pub fn load(&self) -> Option<Vec<MergedChannel>> {
        let raw = match self.store.get(CHANNELS_STORAGE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::error!("Error loading channels from storage: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(channels) => Some(channels),
            Err(e) => {
                tracing::error!("Error loading channels from storage: {}", e);
                None
            }
        }
    }

    /// Overwrite the saved selection
    pub fn save(&self, channels: &[MergedChannel]) -> Result<()> {
        let json = serde_json::to_string(channels)?;
        self.store.set(CHANNELS_STORAGE_KEY, &json)?;
        tracing::debug!("Saved {} channels", channels.len());
        Ok(())
    }
}
