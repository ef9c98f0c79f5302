//! Key/value stores that hold tree snapshots.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::PersistError;
use crate::{Error, Result, tree::Map, tree::Value};

/// A key/value store holding plain data.
///
/// Writes may be buffered until [`Store::sync`]; [`Store::close`] syncs and
/// makes every further operation fail with [`PersistError::StoreClosed`].
pub trait Store: Send + fmt::Debug {
    /// Open the store at `path`, creating it lazily on first sync.
    fn open(path: &Path) -> Result<Self>
    where
        Self: Sized;

    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn get_or(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Make buffered writes durable.
    fn sync(&mut self) -> Result<()>;

    /// Sync and release the store.
    fn close(&mut self) -> Result<()>;

    /// Short description for logs and errors.
    fn describe(&self) -> String;
}

/// The current snapshot file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const FILE_FORMAT_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_file_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != FILE_FORMAT_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported snapshot file version {version}; only version {FILE_FORMAT_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_file_version"
    )]
    version: u8,
    #[serde(default)]
    entries: Map,
}

/// A store kept in one JSON file.
///
/// The whole file is read on open and rewritten on sync, through a
/// temporary sibling file that replaces the original atomically.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map,
    dirty: bool,
    closed: bool,
}

impl JsonFileStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(PersistError::StoreClosed {
                store: self.describe(),
            }
            .into());
        }
        Ok(())
    }

    fn write_file(&self) -> Result<()> {
        let file = StoreFile {
            version: FILE_FORMAT_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| -> Error { PersistError::SerializationFailed { source: e }.into() })?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let io_error = |source: std::io::Error| -> Error {
            PersistError::FileIo {
                path: self.path.display().to_string(),
                source,
            }
            .into()
        };
        std::fs::write(&tmp_path, json).map_err(io_error)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_error)
    }
}

impl Store for JsonFileStore {
    /// A missing file opens as an empty store.
    fn open(path: &Path) -> Result<Self> {
        let entries = match std::fs::read_to_string(path) {
            Ok(json) => {
                let file: StoreFile = serde_json::from_str(&json).map_err(|e| -> Error {
                    PersistError::DeserializationFailed {
                        path: path.display().to_string(),
                        source: e,
                    }
                    .into()
                })?;
                file.entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(PersistError::FileIo {
                    path: path.display().to_string(),
                    source: e,
                }
                .into());
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
            closed: false,
        })
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.check_open()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.check_open()?;
        if self.entries.get(key) == Some(&value) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.check_open()?;
        if self.dirty {
            self.write_file()?;
            self.dirty = false;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.sync()?;
        self.closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        if self.closed || !self.dirty {
            return;
        }
        if let Err(e) = self.write_file() {
            tracing::error!(store = %self.describe(), "Failed to sync store on drop: {e}");
        }
    }
}

/// An in-process store.
///
/// Clones made with [`MemoryStore::reopen`] share content, which lets a test
/// close a store and open "the same file" again.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Map>>,
    syncs: Arc<AtomicUsize>,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new open handle on the same content.
    pub fn reopen(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            syncs: Arc::clone(&self.syncs),
            closed: false,
        }
    }

    /// Number of syncs performed through any handle on this content.
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    /// Copy of the current content.
    pub fn contents(&self) -> Map {
        self.entries.lock().unwrap().clone()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(PersistError::StoreClosed {
                store: self.describe(),
            }
            .into());
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    /// Memory stores have no backing file; every open starts empty.
    fn open(_path: &Path) -> Result<Self> {
        Ok(Self::new())
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.check_open()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.check_open()?;
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.check_open()?;
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
