use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::ClientResult;

/// Durable client-side key/value storage, one JSON object per file.
///
/// Stands in for browser local storage: writes are last-writer-wins and the
/// whole map is rewritten on every change. Values are arbitrary JSON.
#[derive(Debug)]
pub struct KvStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl KvStore {
    pub fn open(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn set(&self, key: &str, value: Value) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    pub fn remove(&self, key: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| anyhow::anyhow!("serializing storage file: {e}"))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
