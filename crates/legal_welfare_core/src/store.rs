//! crates/legal_welfare_core/src/store.rs
//!
//! `KeyedStore` keeps one JSON array per user and namespace on top of a
//! `KeyValueStore`. Keys look like `user_<userId>_<namespace>`.
//!
//! Failures never cross this boundary: reads degrade to an empty list and writes
//! become no-ops, both with an error log. A value that fails to parse is left in
//! place untouched.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::ports::KeyValueStore;

const KEY_PREFIX: &str = "user_";

/// A logical grouping of records sharing a key-naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    AnalyzedDocuments,
    LettersGenerated,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::AnalyzedDocuments, Namespace::LettersGenerated];

    pub fn suffix(&self) -> &'static str {
        match self {
            Namespace::AnalyzedDocuments => "analyzed_documents",
            Namespace::LettersGenerated => "letters_generated",
        }
    }

    /// Whether `key` follows this namespace's naming convention, for any user.
    pub fn owns_key(&self, key: &str) -> bool {
        key.starts_with(KEY_PREFIX) && key.contains(&format!("_{}", self.suffix()))
    }
}

pub fn storage_key(namespace: Namespace, user_id: &str) -> String {
    format!("{}{}_{}", KEY_PREFIX, user_id, namespace.suffix())
}

#[derive(Clone)]
pub struct KeyedStore {
    backend: Arc<dyn KeyValueStore>,
}

impl KeyedStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Reads the list stored for `user_id`. Missing or unreadable lists are empty.
    pub fn read<T: DeserializeOwned>(&self, namespace: Namespace, user_id: &str) -> Vec<T> {
        let key = storage_key(namespace, user_id);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Error reading {} cache: {:?}", namespace.suffix(), e);
                return Vec::new();
            }
        };
        if raw.is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                error!("Error parsing {} cache under '{}': {}", namespace.suffix(), key, e);
                Vec::new()
            }
        }
    }

    /// Replaces the full list stored for `user_id`.
    pub fn write<T: Serialize>(&self, namespace: Namespace, user_id: &str, records: &[T]) {
        let key = storage_key(namespace, user_id);
        let raw = match serde_json::to_string(records) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error serializing {} cache: {}", namespace.suffix(), e);
                return;
            }
        };
        if let Err(e) = self.backend.set(&key, &raw) {
            error!("Error writing {} cache: {:?}", namespace.suffix(), e);
        }
    }

    pub fn remove(&self, namespace: Namespace, user_id: &str) {
        if let Err(e) = self.backend.remove(&storage_key(namespace, user_id)) {
            error!("Error clearing {} cache: {:?}", namespace.suffix(), e);
        }
    }

    /// Removes every key that belongs to one of the namespaces, for every user.
    /// Unrelated keys are left alone. Returns how many keys were removed.
    pub fn remove_all_namespaced(&self) -> usize {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!("Error clearing all user caches: {:?}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys
            .iter()
            .filter(|key| Namespace::ALL.iter().any(|ns| ns.owns_key(key)))
        {
            match self.backend.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => error!("Error removing cache key '{}': {:?}", key, e),
            }
        }
        debug!("Removed {} user cache keys", removed);
        removed
    }
}
