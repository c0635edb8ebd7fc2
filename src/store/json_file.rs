//! JSON-file [`DocumentStore`] backend.
//!
//! One file per collection under the data directory
//! (`<data_dir>/<collection>.json`), each holding a `key → document` object.
//! Documents are re-read on every access so that concurrent gateway
//! processes sharing a data directory observe each other's writes, at
//! last-write-wins granularity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{merge_document, DocumentStore};
use crate::error::{GateError, Result};

/// File-backed document store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| GateError::Storage(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    fn load_collection(path: &Path) -> Result<HashMap<String, Value>> {
        let data = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(GateError::Storage(format!("read {}: {e}", path.display()))),
        };
        serde_json::from_str(&data)
            .map_err(|e| GateError::Storage(format!("parse {}: {e}", path.display())))
    }

    fn save_collection(path: &Path, docs: &HashMap<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(docs)
            .map_err(|e| GateError::Storage(format!("serialize collection: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| GateError::Storage(format!("write {}: {e}", path.display())))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let docs = Self::load_collection(&self.collection_path(collection))?;
        Ok(docs.get(key).cloned())
    }

    async fn merge(&self, collection: &str, key: &str, patch: Value) -> Result<()> {
        let path = self.collection_path(collection);
        let mut docs = Self::load_collection(&path)?;
        let entry = docs
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        merge_document(entry, patch);
        Self::save_collection(&path, &docs)
    }
}
