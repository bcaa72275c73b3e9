//! JSON store for uploaded logs and user exclusions.
//!
//! `store.json` is the source of truth. Reading it normalizes legacy data:
//! any persisted exclusion that collides with the built-in list is stripped
//! and the file is rewritten, so user state never shadows a built-in.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculate::is_auto_excluded;
use crate::models::StoredLog;

use super::{StorageConfig, StorageError};

/// Persisted application state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Store {
    #[serde(default)]
    pub logs: Vec<StoredLog>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl Store {
    /// Find a log by its normalized URL.
    pub fn find_by_normalized_url(&self, normalized_url: &str) -> Option<&StoredLog> {
        self.logs.iter().find(|l| l.normalized_url == normalized_url)
    }

    /// Whether a name is in the user exclusion list (case-insensitive).
    pub fn has_exclusion(&self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        self.exclusions.iter().any(|x| x.trim().to_lowercase() == key)
    }
}

/// Read the store, creating an empty one when the file is missing.
///
/// Legacy exclusion entries that collide with the built-in list are dropped
/// and the cleaned store is written back.
pub fn read_store(config: &StorageConfig) -> Result<Store, StorageError> {
    let path = config.store_path();
    if !path.exists() {
        return Ok(Store::default());
    }

    let raw = fs::read_to_string(&path)?;
    let mut store: Store = serde_json::from_str(&raw)?;

    let before = store.exclusions.len();
    store.exclusions.retain(|x| !is_auto_excluded(x));
    if store.exclusions.len() != before {
        info!(
            "Stripped {} built-in exclusion(s) from persisted store",
            before - store.exclusions.len()
        );
        write_store(config, &store)?;
    }

    debug!(
        "Read store: {} logs, {} exclusions",
        store.logs.len(),
        store.exclusions.len()
    );
    Ok(store)
}

/// Write the store, creating the data directory if needed.
pub fn write_store(config: &StorageConfig, store: &Store) -> Result<(), StorageError> {
    fs::create_dir_all(&config.data_dir)?;
    let json = serde_json::to_string_pretty(store)?;
    fs::write(config.store_path(), json)?;
    Ok(())
}

/// Replace the store with an empty one.
pub fn reset_store(config: &StorageConfig) -> Result<Store, StorageError> {
    let store = Store::default();
    write_store(config, &store)?;
    Ok(store)
}
