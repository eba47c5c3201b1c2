//! Durable key/value slots holding the encoded store state.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::SlotError;

/// A string-valued key/value store. The store only ever uses one key.
pub trait StorageSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// Slot backed by one JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_err(key: &str) -> impl FnOnce(std::io::Error) -> SlotError + '_ {
    move |source| SlotError::Io {
        key: key.to_string(),
        source,
    }
}

impl StorageSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key)(e)),
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves a
    /// half-written slot behind.
    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        std::fs::create_dir_all(&self.dir).map_err(io_err(key))?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value).map_err(io_err(key))?;
        std::fs::rename(&tmp, &path).map_err(io_err(key))
    }
}

/// In-process slot for tests and embedders that handle durability
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-seeded with `value` under `key`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slot = Self::new();
        slot.entries.insert(key.into(), value.into());
        slot
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
