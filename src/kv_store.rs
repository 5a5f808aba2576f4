use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use serde_json::{Map, Value};

use crate::{error::SyncResult, persist};

/// Small settings store holding JSON values under string keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> SyncResult<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> SyncResult<()>;
}

/// All keys live in one JSON object document.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_document(&self) -> SyncResult<Map<String, Value>> {
        Ok(persist::read_json(&self.path)?.unwrap_or_default())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> SyncResult<Option<Value>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> SyncResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.read_document()?;
        document.insert(key.to_owned(), value);
        persist::write_json_atomic(&self.path, &document)
    }
}

#[derive(Default)]
pub struct MemoryStore(Mutex<HashMap<String, Value>>);

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> SyncResult<Option<Value>> {
        Ok(self.0.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> SyncResult<()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_owned(), value);
        Ok(())
    }
}
